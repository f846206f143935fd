//! Template layer - filesystem boundary
//!
//! Provides the trusted boundary for:
//! - Template file → document parsing (ingress)
//! - Document → output file serialization (egress)
//!
//! Outputs are written to a temporary file in the destination directory and
//! moved into place only once fully written, so a failed run never leaves a
//! partial artifact behind.

use crate::error::{ParseError, WriteError};
use crate::parsers::{LineParser, TemplateKind, TemplateParser, XmlParser};
use optfile_artifact::{ContentHash, LineDocument, XmlDocument};
use std::io::Write;
use std::path::Path;

/// Default maximum template size (10 MiB)
pub const DEFAULT_MAX_TEMPLATE_SIZE: usize = 10 * 1024 * 1024;

/// Reads templates and writes artifacts
#[derive(Debug, Clone)]
pub struct TemplateLayer {
    /// Maximum template size to read (bytes)
    max_template_size: usize,
}

impl TemplateLayer {
    /// Create layer with the default size limit
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_max_size(DEFAULT_MAX_TEMPLATE_SIZE)
    }

    /// Create layer with a specific size limit
    #[inline]
    #[must_use]
    pub fn with_max_size(max_template_size: usize) -> Self {
        Self { max_template_size }
    }

    /// Configured size limit
    #[inline]
    #[must_use]
    pub fn max_template_size(&self) -> usize {
        self.max_template_size
    }

    /// Read a template as UTF-8 text
    ///
    /// # Errors
    /// - `ParseError::Io` if the file cannot be read
    /// - `ParseError::TooLarge` if it exceeds the size limit
    /// - `ParseError::Encoding` if it is not UTF-8
    pub fn read_text(&self, path: &Path) -> Result<String, ParseError> {
        let bytes = std::fs::read(path).map_err(|e| ParseError::io_error(path, e))?;
        if bytes.len() > self.max_template_size {
            return Err(ParseError::TooLarge {
                path: path.to_path_buf(),
                size: bytes.len(),
                max: self.max_template_size,
            });
        }
        String::from_utf8(bytes).map_err(|_| ParseError::Encoding {
            path: path.to_path_buf(),
        })
    }

    /// Read a line template
    ///
    /// # Errors
    /// See [`TemplateLayer::read_text`]
    pub fn read_lines(&self, path: &Path) -> Result<LineDocument, ParseError> {
        let text = self.read_text(path)?;
        let document = LineParser.parse(&text).map_err(|e| e.at(path))?;
        tracing::debug!(path = %path.display(), lines = document.len(), "line template read");
        Ok(document)
    }

    /// Read a structured template
    ///
    /// # Errors
    /// See [`TemplateLayer::read_text`]; also `ParseError::Syntax` naming
    /// `path` when the markup is malformed
    pub fn read_xml(&self, path: &Path) -> Result<XmlDocument, ParseError> {
        let text = self.read_text(path)?;
        let document = XmlParser.parse(&text).map_err(|e| e.at(path))?;
        tracing::debug!(path = %path.display(), root = %document.root.name, "structured template read");
        Ok(document)
    }

    /// Check that a template parses with the parser chosen by its extension
    ///
    /// # Errors
    /// Returns the [`ParseError`] the job would hit at run time
    pub fn check_template(&self, path: &Path) -> Result<TemplateKind, ParseError> {
        let kind = TemplateKind::for_path(path);
        match kind {
            TemplateKind::Xml => {
                self.read_xml(path)?;
            }
            TemplateKind::Lines => {
                self.read_lines(path)?;
            }
        }
        Ok(kind)
    }

    /// Atomically write text to `path`
    ///
    /// # Errors
    /// - `WriteError::Io` if the temporary file cannot be created or written
    /// - `WriteError::Persist` if it cannot be moved to `path`
    pub fn write_text(&self, path: &Path, text: &str) -> Result<ContentHash, WriteError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| WriteError::io_error(path, e))?;
        tmp.write_all(text.as_bytes())
            .and_then(|()| tmp.flush())
            .map_err(|e| WriteError::io_error(path, e))?;
        tmp.persist(path).map_err(|e| WriteError::Persist {
            path: path.to_path_buf(),
            source: e.error,
        })?;

        let checksum = ContentHash::compute(text.as_bytes());
        tracing::debug!(path = %path.display(), bytes = text.len(), checksum = %checksum.short(), "artifact written");
        Ok(checksum)
    }

    /// Serialize and write a line document
    ///
    /// # Errors
    /// See [`TemplateLayer::write_text`]
    pub fn write_lines(&self, path: &Path, document: &LineDocument) -> Result<ContentHash, WriteError> {
        self.write_text(path, &LineParser.serialize(document))
    }

    /// Serialize and write a structured document
    ///
    /// # Errors
    /// See [`TemplateLayer::write_text`]
    pub fn write_xml(&self, path: &Path, document: &XmlDocument) -> Result<ContentHash, WriteError> {
        self.write_text(path, &XmlParser.serialize(document))
    }
}

impl Default for TemplateLayer {
    fn default() -> Self {
        Self::new()
    }
}
