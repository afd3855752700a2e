//! Error types for hotlog-conf.

use std::fmt;
use std::path::PathBuf;

/// Result type alias for hotlog-conf operations.
pub type Result<T> = std::result::Result<T, ConfError>;

/// Errors that can occur while loading, validating or swapping a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfError {
    /// The configuration source could not be opened or read.
    #[error("IO error on '{}': {source}", path.display())]
    Io {
        /// Path of the source that failed
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// A physical or logical line exceeds the maximum line length.
    ///
    /// Physical lines are read no further than two bytes past the maximum,
    /// so `len` is at most `max + 2` for them.
    #[error("Line too long: {len} bytes exceeds the maximum of {max}")]
    LineTooLong {
        /// Length of the offending line in bytes
        len: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// Malformed global option, format or rule line.
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Unrecognized `@` directive name.
    #[error("Unknown option: '{0}'")]
    UnknownOption(String),

    /// A bounded-width field overflows its storage.
    #[error("{what} too long: {len} bytes exceeds the maximum of {max}")]
    NameTooLong {
        /// Which field overflowed
        what: &'static str,
        /// Actual length in bytes
        len: usize,
        /// Maximum allowed length
        max: usize,
    },

    /// Failed to set up the built-in default format or rule.
    #[error("Failed to initialize built-in resources: {0}")]
    ResourceInit(String),

    /// The built configuration is internally inconsistent.
    #[error("Configuration validation failed: {0}")]
    Validation(String),

    /// A per-line failure, annotated with where it happened.
    #[error("{source_name}:{line}: {source}")]
    AtLine {
        /// Human-readable name of the source (usually its path)
        source_name: String,
        /// 1-based number of the first physical line of the logical line
        line: usize,
        /// The failure itself
        #[source]
        source: Box<ConfError>,
    },

    /// File watching failed to initialize.
    #[error("File watching error: {0}")]
    Watch(String),

    /// Reload was requested on a handle that has been shut down.
    #[error("No active configuration (handle has been shut down)")]
    NotActive,
}

impl ConfError {
    /// Build a syntax error from anything printable.
    pub fn syntax(msg: impl Into<String>) -> Self {
        Self::Syntax(msg.into())
    }

    /// Wrap this error with the source name and line number it came from.
    pub fn at_line(self, source_name: impl Into<String>, line: usize) -> Self {
        Self::AtLine {
            source_name: source_name.into(),
            line,
            source: Box::new(self),
        }
    }

    /// The innermost error, with any line annotations stripped.
    pub fn root(&self) -> &ConfError {
        match self {
            Self::AtLine { source, .. } => source.root(),
            other => other,
        }
    }

    /// Line number attached to this error, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::AtLine { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Validation error for a built configuration.
#[derive(Debug)]
pub enum ValidationError {
    /// Custom validation error with a message.
    Custom(String),

    /// A specific field has an invalid value.
    InvalidField {
        /// The field name
        field: String,
        /// The reason why it's invalid
        reason: String,
    },

    /// Multiple validation errors occurred.
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Create a custom validation error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(msg) => write!(f, "{}", msg),
            Self::InvalidField { field, reason } => {
                write!(f, "Field '{}' is invalid: {}", field, reason)
            }
            Self::Multiple(errors) => {
                writeln!(f, "Multiple validation errors:")?;
                for (i, err) in errors.iter().enumerate() {
                    writeln!(f, "  {}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ConfError {
    fn from(err: ValidationError) -> Self {
        ConfError::Validation(err.to_string())
    }
}
