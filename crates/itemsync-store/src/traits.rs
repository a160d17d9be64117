//! Record store trait
//!
//! The coarse-grained search-then-write surface every external store
//! implementation provides. There is no atomic upsert; callers compose
//! find, create, load, and save, and handle the save-time uniqueness
//! conflict themselves.

use async_trait::async_trait;

use crate::error::StoreResult;
use crate::record::{NaturalKey, Partition, RecordDraft, RecordRef};

/// Abstraction over an external record store.
///
/// The search index behind [`RecordStore::find`] may be eventually
/// consistent: a record created a moment ago is allowed to be missing
/// from find results. Uniqueness of (partition, natural key) is only
/// guaranteed to be checked at write time, which is why
/// [`RecordStore::create`] can fail with a uniqueness conflict even
/// after find returned nothing.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Find records by natural key within a partition.
    ///
    /// Returns all matching references. More than one match indicates a
    /// store inconsistency; callers decide how to break the tie.
    async fn find(&self, partition: &Partition, key: &NaturalKey) -> StoreResult<Vec<RecordRef>>;

    /// Create a new record from an unpersisted draft.
    ///
    /// # Returns
    /// The store-assigned reference of the created record.
    ///
    /// # Errors
    /// `StoreError::UniquenessConflict` if a record with the same
    /// natural key already exists in the partition.
    async fn create(&self, draft: RecordDraft) -> StoreResult<RecordRef>;

    /// Load a record into a mutable working copy.
    async fn load(&self, record_ref: &RecordRef) -> StoreResult<RecordDraft>;

    /// Persist changes made to a loaded draft.
    ///
    /// # Returns
    /// The reference of the saved record (unchanged by stores that keep
    /// references stable).
    async fn save(&self, draft: RecordDraft) -> StoreResult<RecordRef>;
}
