//! Engine error types
//!
//! Validation failures abort an upsert before any write; store errors
//! pass through with their detail intact. Per-attribute problems are
//! not errors at all — they accumulate as warnings on the outcome.

use thiserror::Error;

use itemsync_store::error::StoreError;

/// Error that can occur while resolving or reconciling an upsert.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A required attribute is missing or malformed. Raised before any
    /// write is attempted.
    #[error("validation failed for '{field}': {message}")]
    Validation { field: String, message: String },

    /// The external store failed; detail is reported verbatim.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Create a validation error naming the offending field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The field named by a validation error, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            EngineError::Validation { field, .. } => Some(field),
            EngineError::Store(_) => None,
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
