//! Template parsers for the two document families
//!
//! - Structured job descriptors (Marlin steering, LCSIM, GEAR, LCDD) via
//!   `quick-xml`
//! - Run-control text (whizard.in, Mokka steering, SLIC macros) as lines

use crate::error::ParseError;
use std::path::Path;

mod lines;
mod xml;

pub use lines::LineParser;
pub use xml::XmlParser;

/// Parser trait for converting template text into a document and back
///
/// Implement this trait to add support for new template formats.
pub trait TemplateParser: Send + Sync + 'static {
    /// The document type this parser produces
    type Output;

    /// Parse content string into a document
    ///
    /// # Errors
    /// Returns [`ParseError::Syntax`] when the content is malformed
    fn parse(&self, content: &str) -> Result<Self::Output, ParseError>;

    /// Serialize a document back into text
    fn serialize(&self, document: &Self::Output) -> String;

    /// Check if this parser can handle the given path
    fn can_parse(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions()
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
    }

    /// Supported file extensions (without dot)
    fn extensions(&self) -> &[&str];
}

/// Document family of a template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    /// Attributed tree
    Xml,
    /// Plain lines
    Lines,
}

impl TemplateKind {
    /// Pick the family from a file extension; anything not markup is lines
    #[must_use]
    pub fn for_path(path: &Path) -> Self {
        if XmlParser.can_parse(path) {
            Self::Xml
        } else {
            Self::Lines
        }
    }
}
