//! Natural-key resolver
//!
//! Looks up an existing external record by business identifier, scoped
//! to a partition. More than one match is a store inconsistency: the
//! resolver picks a deterministic winner and logs the ambiguity, but
//! never merges distinct records. Transport failures surface to the
//! caller so the whole upsert can be retried at a higher level.

use tracing::warn;

use itemsync_store::error::StoreResult;
use itemsync_store::record::{NaturalKey, Partition, RecordRef};
use itemsync_store::traits::RecordStore;

/// Outcome of a natural-key lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Exactly one record resolved (after tie-break, if any).
    Found(RecordRef),
    /// No record exists for the key in the partition.
    NotFound,
}

/// Resolve a natural key to a record reference within a partition.
///
/// Ambiguous results tie-break to the lexicographically smallest
/// reference id, which is stable across runs and store backends.
pub async fn resolve<S: RecordStore + ?Sized>(
    store: &S,
    partition: &Partition,
    key: &NaturalKey,
) -> StoreResult<Resolution> {
    let mut refs = store.find(partition, key).await?;

    if refs.len() > 1 {
        refs.sort();
        warn!(
            partition = %partition,
            natural_key = %key,
            candidates = ?refs,
            "multiple records share one natural key, taking the smallest reference"
        );
    }

    Ok(match refs.into_iter().next() {
        Some(r) => Resolution::Found(r),
        None => Resolution::NotFound,
    })
}
