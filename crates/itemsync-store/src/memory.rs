//! In-memory record store
//!
//! Reference implementation of [`RecordStore`] used by tests and as an
//! executable model of external store semantics: uniqueness is enforced
//! at write time while the search index may lag behind, so create races
//! are reproducible deterministically.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::record::{NaturalKey, Partition, RecordDraft, RecordRef};
use crate::traits::RecordStore;

/// In-memory [`RecordStore`] with simulated search-index lag.
///
/// `delay_visibility(n)` makes the next `n` find calls return stale
/// (empty) results while create still enforces uniqueness against the
/// authoritative table — the exact window in which two concurrent
/// creators collide.
#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<BTreeMap<RecordRef, RecordDraft>>,
    next_id: AtomicU64,
    stale_finds: AtomicU32,
    fail_next_write: Mutex<Option<StoreError>>,
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` find calls return no results, simulating an
    /// eventually consistent search index that has not caught up.
    pub fn delay_visibility(&self, n: u32) {
        self.stale_finds.store(n, Ordering::SeqCst);
    }

    /// Inject a failure into the next create or save call.
    pub fn fail_next_write(&self, err: StoreError) {
        *self.fail_next_write.lock().expect("poisoned") = Some(err);
    }

    /// Insert a record directly, bypassing the uniqueness check.
    ///
    /// Models a pre-existing store inconsistency (duplicate records for
    /// one natural key) for ambiguity handling tests.
    pub async fn seed_record(&self, mut draft: RecordDraft) -> RecordRef {
        let record_ref = match draft.record_ref.clone() {
            Some(r) => r,
            None => {
                let r = self.allocate_ref();
                draft.record_ref = Some(r.clone());
                r
            }
        };
        self.records.write().await.insert(record_ref.clone(), draft);
        record_ref
    }

    /// Number of records currently persisted.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    fn allocate_ref(&self) -> RecordRef {
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        RecordRef::new(format!("rec-{n}"))
    }

    fn take_injected_failure(&self) -> Option<StoreError> {
        self.fail_next_write.lock().expect("poisoned").take()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn find(&self, partition: &Partition, key: &NaturalKey) -> StoreResult<Vec<RecordRef>> {
        let stale = self
            .stale_finds
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if stale {
            debug!(partition = %partition, natural_key = %key, "search index lagging, returning stale result");
            return Ok(Vec::new());
        }

        let records = self.records.read().await;
        let mut refs: Vec<RecordRef> = records
            .values()
            .filter(|r| &r.partition == partition && &r.natural_key == key)
            .filter_map(|r| r.record_ref.clone())
            .collect();
        refs.sort();
        Ok(refs)
    }

    async fn create(&self, mut draft: RecordDraft) -> StoreResult<RecordRef> {
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }
        if draft.record_ref.is_some() {
            return Err(StoreError::invalid_data(
                "create called with an already-persisted draft",
            ));
        }

        let mut records = self.records.write().await;
        let duplicate = records
            .values()
            .any(|r| r.partition == draft.partition && r.natural_key == draft.natural_key);
        if duplicate {
            return Err(StoreError::uniqueness_conflict(
                draft.partition.clone(),
                draft.natural_key.clone(),
            ));
        }

        let record_ref = self.allocate_ref();
        draft.record_ref = Some(record_ref.clone());
        records.insert(record_ref.clone(), draft);
        Ok(record_ref)
    }

    async fn load(&self, record_ref: &RecordRef) -> StoreResult<RecordDraft> {
        self.records
            .read()
            .await
            .get(record_ref)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                record_ref: record_ref.clone(),
            })
    }

    async fn save(&self, draft: RecordDraft) -> StoreResult<RecordRef> {
        if let Some(err) = self.take_injected_failure() {
            return Err(err);
        }
        let record_ref = draft.record_ref.clone().ok_or_else(|| {
            StoreError::invalid_data("save called with an unpersisted draft")
        })?;

        let mut records = self.records.write().await;
        if !records.contains_key(&record_ref) {
            return Err(StoreError::NotFound { record_ref });
        }
        records.insert(record_ref.clone(), draft);
        Ok(record_ref)
    }
}
