//! Domain-level error type.
//!
//! This is the internal plumbing error — configuration parsing, I/O during
//! startup, and anything else a leaf component can fail with. It is
//! distinct from `SupervisorError` (defined in `pgw-supervisor`), which is
//! the caller-facing taxonomy from the dispatch contract.

use thiserror::Error;

/// Result type alias for domain-level operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Domain-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the failing operation.
        message: String,
        /// Underlying error, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration is missing a required field or file.
    #[error("Missing configuration: {0}")]
    ConfigMissing(String),

    /// Configuration has an invalid value.
    #[error("Invalid configuration for '{key}': {message}")]
    ConfigInvalid {
        /// The configuration key that failed validation.
        key: String,
        /// Reason it failed.
        message: String,
    },

    /// JSON parsing or serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal invariant violation; should not normally be reachable.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of what went wrong.
        message: String,
    },
}

impl Error {
    /// Create an I/O error without a source.
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// Create an I/O error with an underlying source.
    pub fn io_with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        message: S,
        source: E,
    ) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an internal error.
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }
}
