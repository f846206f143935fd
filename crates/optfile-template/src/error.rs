//! Error types for the template layer
//!
//! Provides error handling for:
//! - Parse operations (template file → document)
//! - Patch operations (directives and line rules)
//! - Write operations (document → output file)

use optfile_artifact::PathError;
use std::path::{Path, PathBuf};

/// Errors while loading a template
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// IO error during file read
    #[error("io error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Markup cannot be parsed
    #[error("syntax error in {}: {message}", .path.display())]
    Syntax { path: PathBuf, message: String },

    /// Template exceeds the configured size limit
    #[error("template {} too large: {size} bytes (max: {max})", .path.display())]
    TooLarge {
        path: PathBuf,
        size: usize,
        max: usize,
    },

    /// Template is not valid UTF-8
    #[error("template {} is not valid UTF-8", .path.display())]
    Encoding { path: PathBuf },
}

impl ParseError {
    /// Syntax error not yet tied to a file
    pub fn syntax(message: impl Into<String>) -> Self {
        Self::Syntax {
            path: PathBuf::new(),
            message: message.into(),
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attach the template path to a syntax error
    #[must_use]
    pub fn at(self, template: &Path) -> Self {
        match self {
            Self::Syntax { message, .. } => Self::Syntax {
                path: template.to_path_buf(),
                message,
            },
            other => other,
        }
    }

    /// Template path this error refers to
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. }
            | Self::Syntax { path, .. }
            | Self::TooLarge { path, .. }
            | Self::Encoding { path } => path,
        }
    }
}

/// Errors while applying directives or line rules
#[derive(Debug, thiserror::Error)]
pub enum PatchError {
    /// A resource required by a directive could not be provided
    #[error("resource not found: {resource} (needed by {target})")]
    ResourceNotFound { resource: String, target: String },

    /// A mandatory parameter is absent
    #[error("missing mandatory field '{field}'")]
    FieldMissing { field: String },

    /// A directive cannot be applied to the document
    #[error("invalid target {target}: {reason}")]
    InvalidTarget { target: String, reason: String },
}

impl PatchError {
    /// Create missing field error
    pub fn field_missing(field: impl Into<String>) -> Self {
        Self::FieldMissing {
            field: field.into(),
        }
    }

    /// Create resource error
    pub fn resource_not_found(resource: impl Into<String>, target: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource: resource.into(),
            target: target.into(),
        }
    }
}

impl From<PathError> for PatchError {
    fn from(err: PathError) -> Self {
        let target = match &err {
            PathError::EmptySegment => String::new(),
            PathError::InvalidSegment(s) | PathError::NotSynthesizable(s) => s.clone(),
        };
        Self::InvalidTarget {
            target,
            reason: err.to_string(),
        }
    }
}

/// Errors while writing an artifact
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// IO error preparing or writing the temporary file
    #[error("io error writing {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Temporary file could not be moved into place
    #[error("cannot persist {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WriteError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Output path this error refers to
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Io { path, .. } | Self::Persist { path, .. } => path,
        }
    }
}
