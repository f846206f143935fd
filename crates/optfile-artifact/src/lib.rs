//! Job option file document model
//!
//! In-memory representations shared by the template layer and the
//! synthesizers. Nothing here touches the filesystem.
//!
//! # Core Concepts
//!
//! - [`XmlDocument`] / [`Element`] / [`Node`]: order-preserving attributed tree
//! - [`LineDocument`]: text split into terminator-preserving lines
//! - [`ElementPath`] / [`Selector`]: first-match addressing inside a tree
//! - [`PatchDirective`]: target + action + insertion rule
//! - [`ContentHash`]: Blake3 fingerprint of written artifacts
//!
//! # Example
//!
//! ```rust
//! use optfile_artifact::{Element, ElementPath, XmlDocument};
//!
//! let root = Element::new("marlin").with_child(
//!     Element::new("global").with_child(
//!         Element::new("parameter")
//!             .with_attribute("name", "Verbosity")
//!             .with_text("DEBUG"),
//!     ),
//! );
//! let doc = XmlDocument::new(root);
//! let path = ElementPath::parse("global/parameter[@name='Verbosity']").unwrap();
//! assert_eq!(doc.find(&path).and_then(|e| e.text()).as_deref(), Some("DEBUG"));
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod directive;
mod hash;
mod lines;
mod path;
mod tree;

pub use directive::{
    DirectiveOutcome, PatchAction, PatchDirective, PatchReport, PatchStatus, PatchValue,
    Registration, TextCondition, WhenAbsent,
};
pub use hash::ContentHash;
pub use lines::{line_content, LineDocument};
pub use path::{AttrCondition, AttrMatch, ElementPath, PathError, Selector};
pub use tree::{Attribute, Element, Node, XmlDeclaration, XmlDocument};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
