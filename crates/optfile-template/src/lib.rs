//! Template layer for job option files
//!
//! The boundary between template files on disk and the in-memory document
//! model, plus the two transformers that turn a template into an artifact.
//!
//! # Core Operations
//!
//! - **Ingress**: read a template into a [`LineDocument`] or [`XmlDocument`]
//! - **Transform**: [`LineRewriter`] for run-control text, [`TreePatcher`]
//!   for structured job descriptors
//! - **Egress**: atomically write the artifact and fingerprint it
//!
//! # Architecture
//!
//! ```text
//! template → TemplateLayer → document → LineRewriter / TreePatcher → document' → TemplateLayer → artifact
//!                                                   ↑
//!                                           OverlayProvider
//! ```
//!
//! [`LineDocument`]: optfile_artifact::LineDocument
//! [`XmlDocument`]: optfile_artifact::XmlDocument

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod layer;
pub mod overlay;
pub mod parsers;
pub mod patcher;
pub mod rewriter;

pub use error::{ParseError, PatchError, WriteError};
pub use layer::{TemplateLayer, DEFAULT_MAX_TEMPLATE_SIZE};
pub use overlay::{NoOverlay, OverlayProvider};
pub use parsers::{LineParser, TemplateKind, TemplateParser, XmlParser};
pub use patcher::TreePatcher;
pub use rewriter::{
    FlagCheck, Guard, LineAction, LineRewriter, LineRule, MarkerMatch, ParameterLookup,
    Rewritten,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with templates
    pub use crate::error::{ParseError, PatchError, WriteError};
    pub use crate::layer::TemplateLayer;
    pub use crate::overlay::OverlayProvider;
    pub use crate::patcher::TreePatcher;
    pub use crate::rewriter::{LineRewriter, LineRule, ParameterLookup};
    pub use optfile_artifact::{
        ContentHash, ElementPath, LineDocument, PatchAction, PatchDirective, Selector,
        WhenAbsent, XmlDocument,
    };
}
