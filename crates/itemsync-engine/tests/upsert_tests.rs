//! End-to-end upsert behavior against the in-memory store.

use std::sync::Arc;

use itemsync_engine::{FailureCode, Operation, ReconciliationPolicy, UpsertRequest, UpsertResolver};
use itemsync_store::memory::InMemoryStore;
use itemsync_store::prelude::*;

fn resolver(store: Arc<InMemoryStore>) -> UpsertResolver<InMemoryStore> {
    UpsertResolver::new(store, ReconciliationPolicy::default_item())
}

fn valid_request(key: &str) -> UpsertRequest {
    UpsertRequest::new(Partition::new("sub-1"), NaturalKey::new(key))
        .with_attribute("origin_item_id", 42i64)
        .with_attribute("origin_company_id", 7i64)
        .with_attribute("upc_code", "012345678905")
}

#[tokio::test]
async fn upsert_twice_is_idempotent() {
    let store = Arc::new(InMemoryStore::new());
    let resolver = resolver(store.clone());

    let first = resolver.upsert(valid_request("ITEM-001")).await;
    assert!(first.success);
    assert_eq!(first.operation, Some(Operation::Created));

    let second = resolver.upsert(valid_request("ITEM-001")).await;
    assert!(second.success);
    assert_eq!(second.operation, Some(Operation::Updated));

    assert_eq!(first.record_id, second.record_id);
    assert_eq!(first.persisted_attributes, second.persisted_attributes);
    assert_eq!(store.record_count().await, 1);
}

#[tokio::test]
async fn partial_payload_does_not_clear_attributes() {
    let store = Arc::new(InMemoryStore::new());
    let resolver = resolver(store.clone());

    let outcome = resolver
        .upsert(valid_request("ITEM-001").with_attribute("description", "Widget"))
        .await;
    assert!(outcome.success);

    // Second call omits description entirely.
    let outcome = resolver.upsert(valid_request("ITEM-001")).await;
    assert!(outcome.success);

    let record = store.load(outcome.record_id.as_ref().unwrap()).await.unwrap();
    assert_eq!(
        record.attribute("description").and_then(|v| v.as_str()),
        Some("Widget")
    );
}

#[tokio::test]
async fn party_lines_converge_to_one_entry() {
    let store = Arc::new(InMemoryStore::new());
    let resolver = resolver(store.clone());

    let mut last = None;
    for code in ["ACME", "BOLT", "CORE"] {
        let outcome = resolver
            .upsert(valid_request("ITEM-001").with_party_line(12, Some(code.to_string())))
            .await;
        assert!(outcome.success);
        last = outcome.record_id;
    }

    let record = store.load(last.as_ref().unwrap()).await.unwrap();
    let lines = record.sublist("party_lines");
    assert_eq!(lines.len(), 1);
    assert_eq!(
        lines[0].get("party_code").and_then(|v| v.as_str()),
        Some("CORE")
    );
    assert_eq!(
        lines[0].get("preferred").and_then(|v| v.as_boolean()),
        Some(true)
    );
}

#[tokio::test]
async fn racing_creates_converge_to_one_record() {
    let store = Arc::new(InMemoryStore::new());
    // Both upserts' initial lookups miss: the search index has not
    // caught up, exactly the window a create race needs.
    store.delay_visibility(2);

    let resolver_a = resolver(store.clone());
    let resolver_b = resolver(store.clone());

    let (a, b) = tokio::join!(
        resolver_a.upsert(valid_request("ITEM-RACE")),
        resolver_b.upsert(valid_request("ITEM-RACE")),
    );

    assert!(a.success, "first racer failed: {:?}", a.error);
    assert!(b.success, "second racer failed: {:?}", b.error);

    let operations = [a.operation.unwrap(), b.operation.unwrap()];
    assert!(operations.contains(&Operation::Created));
    assert!(operations.contains(&Operation::Updated));

    assert_eq!(a.record_id, b.record_id);
    assert_eq!(store.record_count().await, 1);
}

#[tokio::test]
async fn missing_required_fields_reject_without_write() {
    let store = Arc::new(InMemoryStore::new());
    let resolver = resolver(store.clone());

    let outcome = resolver
        .upsert(UpsertRequest::new(
            Partition::new("sub-1"),
            NaturalKey::new("ITEM-001"),
        ))
        .await;

    assert!(!outcome.success);
    let failure = outcome.error.unwrap();
    assert_eq!(failure.code, FailureCode::Validation);
    assert_eq!(failure.field.as_deref(), Some("origin_item_id"));
    assert_eq!(store.record_count().await, 0);
}

#[tokio::test]
async fn empty_natural_key_rejected() {
    let store = Arc::new(InMemoryStore::new());
    let resolver = resolver(store.clone());

    let outcome = resolver
        .upsert(
            UpsertRequest::new(Partition::new("sub-1"), NaturalKey::new(""))
                .with_attribute("origin_item_id", 1i64)
                .with_attribute("origin_company_id", 2i64)
                .with_attribute("upc_code", "X"),
        )
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.error.unwrap().field.as_deref(), Some("natural_key"));
    assert_eq!(store.record_count().await, 0);
}

#[tokio::test]
async fn legacy_alias_wins_only_when_alone() {
    let store = Arc::new(InMemoryStore::new());
    let resolver = resolver(store.clone());

    let outcome = resolver
        .upsert(
            valid_request("ITEM-001")
                .with_attribute("description", "new wording")
                .with_attribute("sales_description", "legacy wording"),
        )
        .await;
    assert!(outcome.success);
    assert!(!outcome.warnings.is_empty());

    let record = store.load(outcome.record_id.as_ref().unwrap()).await.unwrap();
    assert_eq!(
        record.attribute("description").and_then(|v| v.as_str()),
        Some("new wording")
    );
    assert!(!record.has_attribute("sales_description"));
}

#[tokio::test]
async fn create_only_attribute_survives_update() {
    let store = Arc::new(InMemoryStore::new());
    let resolver = resolver(store.clone());

    let outcome = resolver
        .upsert(valid_request("ITEM-001").with_attribute("unit_type", "each"))
        .await;
    assert!(outcome.success);

    let outcome = resolver
        .upsert(valid_request("ITEM-001").with_attribute("unit_type", "pair"))
        .await;
    assert!(outcome.success);

    let record = store.load(outcome.record_id.as_ref().unwrap()).await.unwrap();
    assert_eq!(
        record.attribute("unit_type").and_then(|v| v.as_str()),
        Some("each")
    );
}

#[tokio::test]
async fn terminal_store_error_is_reported_verbatim() {
    let store = Arc::new(InMemoryStore::new());
    store.fail_next_write(StoreError::operation_failed("record limit exceeded"));
    let resolver = resolver(store.clone());

    let outcome = resolver.upsert(valid_request("ITEM-001")).await;

    assert!(!outcome.success);
    let failure = outcome.error.unwrap();
    assert_eq!(failure.code, FailureCode::Store);
    assert!(failure.message.contains("record limit exceeded"));
}

#[tokio::test]
async fn unparsable_optional_attribute_warns_but_succeeds() {
    let store = Arc::new(InMemoryStore::new());
    let resolver = resolver(store.clone());

    let outcome = resolver
        .upsert(valid_request("ITEM-001").with_attribute("base_price", "twelve dollars"))
        .await;

    assert!(outcome.success);
    assert!(outcome.warnings.iter().any(|w| w.contains("base_price")));

    let record = store.load(outcome.record_id.as_ref().unwrap()).await.unwrap();
    assert!(!record.has_attribute("base_price"));
}

#[tokio::test]
async fn read_back_reports_persisted_key_attributes() {
    let store = Arc::new(InMemoryStore::new());
    let resolver = resolver(store.clone());

    let outcome = resolver.upsert(valid_request("ITEM-001")).await;
    assert!(outcome.success);

    assert_eq!(
        outcome
            .persisted_attributes
            .get("origin_item_id")
            .and_then(|v| v.as_integer()),
        Some(42)
    );
    assert_eq!(
        outcome
            .persisted_attributes
            .get("upc_code")
            .and_then(|v| v.as_str()),
        Some("012345678905")
    );
}

#[tokio::test]
async fn ambiguous_key_resolves_to_deterministic_record() {
    let store = Arc::new(InMemoryStore::new());

    // Pre-existing store inconsistency: two records for one key.
    let first = store
        .seed_record(RecordDraft::new(
            Partition::new("sub-1"),
            NaturalKey::new("ITEM-DUP"),
        ))
        .await;
    store
        .seed_record(RecordDraft::new(
            Partition::new("sub-1"),
            NaturalKey::new("ITEM-DUP"),
        ))
        .await;

    let resolver = resolver(store.clone());
    let outcome = resolver.upsert(valid_request("ITEM-DUP")).await;

    assert!(outcome.success);
    assert_eq!(outcome.operation, Some(Operation::Updated));
    assert_eq!(outcome.record_id, Some(first));
    // The duplicate is left alone, never merged or deleted.
    assert_eq!(store.record_count().await, 2);
}
