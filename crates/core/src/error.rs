//! Error types for ArborDB
//!
//! Every engine operation fails with one of three conditions:
//!
//! | Variant | Meaning | Retry? |
//! |---------|---------|--------|
//! | `ItemNotFound` | target path is absent | no, expected in normal flows |
//! | `RequestInvalid` | malformed path, limit violation, object/container conflict | no |
//! | `ServiceUnavailable` | I/O or backend failure, corrupt stored data | caller may retry the whole operation |
//!
//! The engine never retries internally, and raw I/O errors are always
//! wrapped into `ServiceUnavailable` with the path that was being touched.

use crate::limits::LimitError;
use crate::name::NameError;
use crate::path::Path;
use std::io;
use thiserror::Error;

/// Result type alias for ArborDB operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the storage engine
#[derive(Debug, Error)]
pub enum Error {
    /// Target path is absent
    #[error("item not found: {path}")]
    ItemNotFound {
        /// Canonical form of the missing path
        path: String,
    },

    /// Caller error: malformed input, limit violation or object/container conflict
    #[error("request invalid: {reason}")]
    RequestInvalid {
        /// Human-readable explanation
        reason: String,
    },

    /// Backend failure (I/O, corrupt stored data)
    #[error("service unavailable: {reason}")]
    ServiceUnavailable {
        /// Human-readable explanation
        reason: String,
        /// Underlying I/O error, when there is one
        #[source]
        source: Option<io::Error>,
    },
}

impl Error {
    /// Target path is absent
    pub fn not_found(path: &Path) -> Self {
        Error::ItemNotFound {
            path: path.to_string(),
        }
    }

    /// Caller error
    pub fn invalid(reason: impl Into<String>) -> Self {
        Error::RequestInvalid {
            reason: reason.into(),
        }
    }

    /// Backend failure without an underlying I/O error
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Error::ServiceUnavailable {
            reason: reason.into(),
            source: None,
        }
    }

    /// Wrap an I/O error with the filesystem location it came from
    pub fn io(context: impl std::fmt::Display, source: io::Error) -> Self {
        Error::ServiceUnavailable {
            reason: format!("{}: {}", context, source),
            source: Some(source),
        }
    }

    /// Object/container conflict at `path`
    pub fn conflict(path: &Path, detail: &str) -> Self {
        Error::invalid(format!("conflict at {}: {}", path, detail))
    }

    /// Stable error code for callers that render errors
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::ItemNotFound { .. } => "ItemNotFound",
            Error::RequestInvalid { .. } => "RequestInvalid",
            Error::ServiceUnavailable { .. } => "ServiceUnavailable",
        }
    }

    /// Only backend failures may succeed on a later attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::ServiceUnavailable { .. })
    }

    /// True for `ItemNotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::ItemNotFound { .. })
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::ServiceUnavailable {
            reason: format!("I/O error: {}", e),
            source: Some(e),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::unavailable(format!("serialization error: {}", e))
    }
}

impl From<NameError> for Error {
    fn from(e: NameError) -> Self {
        Error::invalid(e.to_string())
    }
}

impl From<LimitError> for Error {
    fn from(e: LimitError) -> Self {
        Error::invalid(e.to_string())
    }
}
