//! Notifier error types
//!
//! These never cross the public boundary: every failure in
//! classification, diffing, or delivery is caught, logged, and
//! swallowed so that a notification problem can never fail or roll
//! back the mutation that triggered it.

use thiserror::Error;

/// Error that can occur while evaluating or delivering a change event.
#[derive(Debug, Error)]
pub enum NotifierError {
    /// Event payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Endpoint answered with a non-success status.
    #[error("delivery rejected with status {status}")]
    DeliveryRejected { status: u16 },

    /// Transport-level delivery failure.
    #[error("delivery failed: {0}")]
    Delivery(#[from] reqwest::Error),

    /// Sink configuration is unusable.
    #[error("invalid sink configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for notifier internals.
pub type NotifierResult<T> = Result<T, NotifierError>;
