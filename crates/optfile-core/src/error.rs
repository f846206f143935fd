//! Error types for artifact preparation
//!
//! Every failure a synthesis call can report falls in one of four kinds:
//! unparsable template, unresolvable resource, missing mandatory field, or
//! unwritable output. Messages name the template and the offending field or
//! resource so a batch job log is actionable on its own.

use optfile_template::{ParseError, PatchError, WriteError};
use std::path::{Path, PathBuf};

/// Failure kind, for callers that branch on the category only
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Template unreadable or malformed
    Parse,
    /// Input, overlay or steering file not found
    ResourceNotFound,
    /// Mandatory parameter absent
    FieldMissing,
    /// Output not writable
    Write,
}

/// Main preparation error type
#[derive(Debug, thiserror::Error)]
pub enum PrepError {
    /// Template cannot be loaded or parsed as its document kind
    #[error("cannot use template {}: {reason}", .template.display())]
    Parse {
        /// Template path
        template: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// A required file cannot be located
    #[error("resource not found: {resource}{}", for_template(.template.as_deref()))]
    ResourceNotFound {
        /// Template being prepared, if any
        template: Option<PathBuf>,
        /// Missing resource
        resource: String,
    },

    /// A mandatory Parameter Set entry is absent
    #[error("missing mandatory field '{field}'{}", for_template(.template.as_deref()))]
    FieldMissing {
        /// Template being prepared, if any
        template: Option<PathBuf>,
        /// Missing key
        field: String,
    },

    /// Output cannot be written
    #[error("cannot write {}{}: {source}", .output.display(), for_template(.template.as_deref()))]
    Write {
        /// Template being prepared, if any
        template: Option<PathBuf>,
        /// Output path
        output: PathBuf,
        /// Underlying failure
        #[source]
        source: WriteError,
    },
}

fn for_template(template: Option<&Path>) -> String {
    template
        .map(|t| format!(" (template {})", t.display()))
        .unwrap_or_default()
}

impl PrepError {
    /// Failure kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse { .. } => ErrorKind::Parse,
            Self::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            Self::FieldMissing { .. } => ErrorKind::FieldMissing,
            Self::Write { .. } => ErrorKind::Write,
        }
    }

    /// Never retried at this layer
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Template the failure refers to
    #[must_use]
    pub fn template(&self) -> Option<&Path> {
        match self {
            Self::Parse { template, .. } => Some(template),
            Self::ResourceNotFound { template, .. }
            | Self::FieldMissing { template, .. }
            | Self::Write { template, .. } => template.as_deref(),
        }
    }

    /// Create missing field error
    pub fn field_missing(field: impl Into<String>) -> Self {
        Self::FieldMissing {
            template: None,
            field: field.into(),
        }
    }

    /// Create resource error
    pub fn resource_not_found(resource: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            template: None,
            resource: resource.into(),
        }
    }

    /// Attach the template being prepared, keeping one already set
    #[must_use]
    pub fn in_template(mut self, path: &Path) -> Self {
        match &mut self {
            Self::ResourceNotFound { template, .. }
            | Self::FieldMissing { template, .. }
            | Self::Write { template, .. } => {
                if template.is_none() {
                    *template = Some(path.to_path_buf());
                }
            }
            Self::Parse { .. } => {}
        }
        self
    }

    /// Wrap a patch failure for `template`
    pub fn patch(template: Option<&Path>, err: PatchError) -> Self {
        let template = template.map(Path::to_path_buf);
        match err {
            PatchError::ResourceNotFound { resource, target } => Self::ResourceNotFound {
                template,
                resource: format!("{resource} for {target}"),
            },
            PatchError::FieldMissing { field } => Self::FieldMissing { template, field },
            PatchError::InvalidTarget { .. } => Self::Parse {
                template: template.unwrap_or_default(),
                reason: err.to_string(),
            },
        }
    }

    /// Wrap a write failure
    pub fn write(template: Option<&Path>, err: WriteError) -> Self {
        Self::Write {
            template: template.map(Path::to_path_buf),
            output: err.path().to_path_buf(),
            source: err,
        }
    }
}

impl From<ParseError> for PrepError {
    fn from(err: ParseError) -> Self {
        let template = err.path().to_path_buf();
        let reason = match err {
            ParseError::Syntax { message, .. } => message,
            ParseError::Io { source, .. } => source.to_string(),
            ParseError::TooLarge { size, max, .. } => {
                format!("too large: {size} bytes (max: {max})")
            }
            ParseError::Encoding { .. } => "not valid UTF-8".to_string(),
        };
        Self::Parse { template, reason }
    }
}

/// Resource Resolver errors
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Name found neither in the working directory nor in a remaining
    /// subdirectory
    #[error("{name} not found in {} or its unused subdirectories", .root.display())]
    NotFound {
        /// Requested base name
        name: String,
        /// Working directory searched
        root: PathBuf,
    },

    /// Working directory cannot be listed
    #[error("cannot scan {}: {source}", .path.display())]
    Io {
        /// Directory being scanned
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },
}

impl From<ResolveError> for PrepError {
    fn from(err: ResolveError) -> Self {
        let resource = match &err {
            ResolveError::NotFound { name, .. } => name.clone(),
            ResolveError::Io { .. } => err.to_string(),
        };
        Self::ResourceNotFound {
            template: None,
            resource,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file unreadable
    #[error("io error reading {}: {source}", .path.display())]
    Io {
        /// Config path
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// Config content invalid
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type alias for preparation operations
pub type PrepResult<T> = Result<T, PrepError>;
