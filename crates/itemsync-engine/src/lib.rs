//! # Upsert Resolution & Reconciliation Engine
//!
//! Converges repeated, concurrent, partially-failing synchronization
//! attempts onto exactly one external record per natural key, with
//! stable sub-collections and safe partial payloads.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌──────────────────┐
//! │   Caller     │────►│ Canonicalize  │────►│  Upsert Resolver │
//! │  (payload)   │     │ (alias table) │     │                  │
//! └──────────────┘     └───────────────┘     └────────┬─────────┘
//!                                                     │
//!                      ┌──────────────┐      ┌────────┴─────────┐
//!                      │  Attribute   │◄─────┤  Resolve / Load  │
//!                      │  Reconciler  │      │  / Create        │
//!                      └──────────────┘      └────────┬─────────┘
//!                      ┌──────────────┐               │
//!                      │     Line     │◄──────────────┤
//!                      │  Reconciler  │               ▼
//!                      └──────────────┘      ┌──────────────────┐
//!                                            │ Save (+ conflict │
//!                                            │ retry-as-update) │
//!                                            └──────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use itemsync_engine::{ReconciliationPolicy, UpsertRequest, UpsertResolver};
//! use itemsync_store::prelude::*;
//!
//! let resolver = UpsertResolver::new(
//!     Arc::new(InMemoryStore::new()),
//!     ReconciliationPolicy::default_item(),
//! );
//!
//! let outcome = resolver
//!     .upsert(
//!         UpsertRequest::new(Partition::new("sub-1"), NaturalKey::new("ITEM-001"))
//!             .with_attribute("origin_item_id", 42i64)
//!             .with_attribute("origin_company_id", 7i64)
//!             .with_attribute("upc_code", "012345678905")
//!             .with_party_line(12, Some("ACME".to_string())),
//!     )
//!     .await;
//!
//! assert!(outcome.success);
//! ```

pub mod canonical;
pub mod error;
pub mod lines;
pub mod policy;
pub mod reconcile;
pub mod resolver;
pub mod upsert;

// Re-exports for convenience
pub use canonical::{canonicalize, CanonicalAttributes};
pub use error::{EngineError, EngineResult};
pub use lines::{reconcile_line, LineOutcome};
pub use policy::{AttributeKind, AttributeSpec, ReconciliationPolicy};
pub use reconcile::{
    coerce_boolean, coerce_decimal, coerce_integer, reconcile, validate_required, ReconcileMode,
};
pub use resolver::{resolve, Resolution};
pub use upsert::{
    FailureCode, Operation, PartyLinePayload, UpsertFailure, UpsertOutcome, UpsertRequest,
    UpsertResolver,
};
