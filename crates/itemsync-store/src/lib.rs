//! # External Record Store Abstraction
//!
//! Core abstractions for talking to an external record store that
//! exposes only a coarse-grained, search-then-write API: no atomic
//! upsert, no transactional multi-record write, and an eventually
//! consistent search index.
//!
//! This crate defines the types and the [`RecordStore`] trait the
//! synchronization engine is built on. Store implementations live
//! behind the trait; the in-memory implementation here doubles as the
//! executable model of store semantics for tests.
//!
//! ## Example
//!
//! ```ignore
//! use itemsync_store::prelude::*;
//!
//! let store = InMemoryStore::new();
//!
//! let draft = RecordDraft::new(Partition::new("sub-1"), NaturalKey::new("ITEM-001"))
//!     .with_attribute("upc_code", "012345678905")
//!     .with_attribute("origin_item_id", 42i64);
//!
//! let record_ref = store.create(draft).await?;
//! let record = store.load(&record_ref).await?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`record`] - Identity newtypes (`Partition`, `NaturalKey`,
//!   `RecordRef`) and the mutable `RecordDraft`
//! - [`value`] - Typed attribute values
//! - [`error`] - Error types with conflict/transient classification
//! - [`traits`] - The `RecordStore` trait
//! - [`memory`] - In-memory reference store with simulated index lag

pub mod error;
pub mod memory;
pub mod record;
pub mod traits;
pub mod value;

/// Prelude module for convenient imports.
///
/// ```
/// use itemsync_store::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{StoreError, StoreResult};
    pub use crate::memory::InMemoryStore;
    pub use crate::record::{
        LineEntry, NaturalKey, Partition, RecordDraft, RecordRef, MAX_NATURAL_KEY_LEN,
    };
    pub use crate::traits::RecordStore;
    pub use crate::value::AttributeValue;
}

// Re-export async_trait for store implementors
pub use async_trait::async_trait;
