//! # Change-Driven Outbound Notifier
//!
//! Emits one signed change event per qualifying external-side
//! mutation, and only for mutations a human made interactively: the
//! origin classification filters out every programmatic write —
//! including the synchronization engine's own — which is what keeps
//! the outbound path from re-triggering the inbound one.
//!
//! ## Pipeline
//!
//! ```text
//! mutation ──► classify origin ──► filter kind ──► diff watched ──► emit
//!                  │ skip             │ skip          │ skip
//!                  ▼                  ▼               ▼
//!              programmatic       create/delete    no change
//! ```
//!
//! Failures anywhere on this path are logged and swallowed; a
//! notification problem never fails the mutation that triggered it.
//!
//! ## Example
//!
//! ```ignore
//! use itemsync_notifier::{
//!     default_item_watchlist, HttpSink, HttpSinkConfig, MutationContext, MutationKind,
//!     MutationOrigin, OutboundNotifier,
//! };
//!
//! let sink = HttpSink::new(HttpSinkConfig::new(
//!     "https://origin.example.com/hooks/item-changed",
//!     secret,
//! ))?;
//! let notifier = OutboundNotifier::new(sink, default_item_watchlist());
//!
//! notifier.notify(&context).await;
//! ```

pub mod context;
pub mod delivery;
pub mod diff;
pub mod error;
pub mod event;
pub mod notifier;
pub mod signature;

// Re-exports for convenience
pub use context::{MutationContext, MutationKind, MutationOrigin};
pub use delivery::{
    ChangeEventSink, HttpSink, HttpSinkConfig, MemorySink, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
pub use diff::{default_item_watchlist, diff_watched, AttributeChange, WatchedAttribute};
pub use error::{NotifierError, NotifierResult};
pub use event::ChangeEvent;
pub use notifier::OutboundNotifier;
