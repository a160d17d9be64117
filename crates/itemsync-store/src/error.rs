//! Record store error types
//!
//! Error definitions with transient/permanent classification and a
//! distinguishable uniqueness-conflict variant for save-time create
//! collisions.

use thiserror::Error;

use crate::record::{NaturalKey, Partition, RecordRef};

/// Error that can occur during record store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failed to establish connection to the external store.
    #[error("connection failed: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timeout after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Referenced record does not exist.
    #[error("record not found: {record_ref}")]
    NotFound { record_ref: RecordRef },

    /// A record with the same natural key already exists in the
    /// partition. Raised at save time when a create collides with a
    /// concurrently created record.
    #[error("uniqueness conflict: natural key '{natural_key}' already exists in partition '{partition}'")]
    UniquenessConflict {
        partition: Partition,
        natural_key: NaturalKey,
    },

    /// The store rejected the payload.
    #[error("invalid data: {message}")]
    InvalidData { message: String },

    /// Operation failed with store-provided detail.
    #[error("operation failed: {message}")]
    OperationFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal error.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl StoreError {
    /// Check if this error is the save-time uniqueness collision that
    /// permits a single retry-as-update.
    pub fn is_uniqueness_conflict(&self) -> bool {
        matches!(self, StoreError::UniquenessConflict { .. })
    }

    /// Check if this error is transient and the whole call may be
    /// retried at a higher level.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::ConnectionFailed { .. } | StoreError::Timeout { .. }
        )
    }

    /// Get an error code for classification.
    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::ConnectionFailed { .. } => "CONNECTION_FAILED",
            StoreError::Timeout { .. } => "TIMEOUT",
            StoreError::NotFound { .. } => "NOT_FOUND",
            StoreError::UniquenessConflict { .. } => "UNIQUENESS_CONFLICT",
            StoreError::InvalidData { .. } => "INVALID_DATA",
            StoreError::OperationFailed { .. } => "OPERATION_FAILED",
            StoreError::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    // Convenience constructors

    /// Create a connection failed error.
    pub fn connection_failed(message: impl Into<String>) -> Self {
        StoreError::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a uniqueness conflict error.
    pub fn uniqueness_conflict(partition: Partition, natural_key: NaturalKey) -> Self {
        StoreError::UniquenessConflict {
            partition,
            natural_key,
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        StoreError::InvalidData {
            message: message.into(),
        }
    }

    /// Create an operation failed error.
    pub fn operation_failed(message: impl Into<String>) -> Self {
        StoreError::OperationFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create an operation failed error with source.
    pub fn operation_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        StoreError::OperationFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        StoreError::Internal {
            message: message.into(),
        }
    }
}

/// Result type for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;
