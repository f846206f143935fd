//! Line template parser

use super::TemplateParser;
use crate::error::ParseError;
use optfile_artifact::LineDocument;

/// Run-control text split into lines
#[derive(Debug, Clone, Copy, Default)]
pub struct LineParser;

impl TemplateParser for LineParser {
    type Output = LineDocument;

    fn parse(&self, content: &str) -> Result<Self::Output, ParseError> {
        Ok(LineDocument::from_text(content))
    }

    fn serialize(&self, document: &Self::Output) -> String {
        document.to_text()
    }

    fn extensions(&self) -> &[&str] {
        &["in", "mac", "steer", "txt"]
    }
}
