//! Upsert resolver
//!
//! Orchestrates the full upsert: resolve the natural key, create or
//! load, reconcile attributes and party line, save. A save-time
//! uniqueness conflict on the create path triggers exactly one
//! automatic retry as an update, which is how concurrent creators of
//! the same key converge on a single record. Any other save failure is
//! terminal.
//!
//! The public boundary returns a structured [`UpsertOutcome`], never an
//! error: validation and store failures are reported in the outcome
//! with enough detail to diagnose without re-running.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use itemsync_store::record::{NaturalKey, Partition, RecordDraft, RecordRef};
use itemsync_store::traits::RecordStore;
use itemsync_store::value::AttributeValue;

use crate::canonical::{canonicalize, CanonicalAttributes};
use crate::error::{EngineError, EngineResult};
use crate::lines::reconcile_line;
use crate::policy::ReconciliationPolicy;
use crate::reconcile::{reconcile, validate_required, ReconcileMode};
use crate::resolver::{resolve, Resolution};

/// Associated-party payload of an upsert request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyLinePayload {
    /// Key value matched against the party sub-collection.
    pub party_id: i64,

    /// Party code written to the matched or appended line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_code: Option<String>,
}

/// Inbound contract of the upsert resolver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertRequest {
    /// Scoping partition.
    pub partition: Partition,

    /// Business identifier of the item.
    pub natural_key: NaturalKey,

    /// Raw attribute payload; aliases are accepted and canonicalized
    /// at the boundary.
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,

    /// Optional associated-party line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_line: Option<PartyLinePayload>,
}

impl UpsertRequest {
    /// Create a request with no attributes.
    pub fn new(partition: Partition, natural_key: NaturalKey) -> Self {
        Self {
            partition,
            natural_key,
            attributes: BTreeMap::new(),
            party_line: None,
        }
    }

    /// Add an attribute using builder pattern.
    #[must_use]
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the party line payload.
    #[must_use]
    pub fn with_party_line(mut self, party_id: i64, party_code: Option<String>) -> Self {
        self.party_line = Some(PartyLinePayload {
            party_id,
            party_code,
        });
        self
    }
}

/// Which branch the upsert took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// A new record was created.
    Created,
    /// An existing record was updated.
    Updated,
}

impl Operation {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Created => "created",
            Operation::Updated => "updated",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Failure classification reported on the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureCode {
    /// A required attribute was missing or malformed; nothing was
    /// written.
    Validation,
    /// The external store failed; detail carried verbatim.
    Store,
}

/// Structured failure carried by an unsuccessful outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertFailure {
    /// Failure classification.
    pub code: FailureCode,

    /// Offending attribute, when the failure names one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// Human-readable detail.
    pub message: String,
}

impl From<EngineError> for UpsertFailure {
    fn from(err: EngineError) -> Self {
        let code = match &err {
            EngineError::Validation { .. } => FailureCode::Validation,
            EngineError::Store(_) => FailureCode::Store,
        };
        Self {
            code,
            field: err.field().map(str::to_string),
            message: err.to_string(),
        }
    }
}

/// Result of one upsert call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertOutcome {
    /// Definite verdict.
    pub success: bool,

    /// Reference of the affected record, when one was saved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordRef>,

    /// Which branch the upsert took.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<Operation>,

    /// Read-back of the key attributes actually persisted, letting the
    /// caller verify the write independent of the store's response.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub persisted_attributes: BTreeMap<String, AttributeValue>,

    /// Accumulated non-fatal per-attribute problems.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// Failure detail when `success` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<UpsertFailure>,
}

impl UpsertOutcome {
    fn failed(err: EngineError, warnings: Vec<String>) -> Self {
        Self {
            success: false,
            record_id: None,
            operation: None,
            persisted_attributes: BTreeMap::new(),
            warnings,
            error: Some(err.into()),
        }
    }
}

/// Orchestrates upserts against a record store under a reconciliation
/// policy.
pub struct UpsertResolver<S> {
    store: Arc<S>,
    policy: ReconciliationPolicy,
}

impl<S: RecordStore> UpsertResolver<S> {
    /// Create a resolver over a store with the given policy.
    pub fn new(store: Arc<S>, policy: ReconciliationPolicy) -> Self {
        Self { store, policy }
    }

    /// The active reconciliation policy.
    pub fn policy(&self) -> &ReconciliationPolicy {
        &self.policy
    }

    /// Run one upsert to completion.
    ///
    /// Sequential calls with the same key and equivalent payload are
    /// idempotent: the second call is a no-op update. Concurrent
    /// callers racing on a fresh key converge to one record; the loser
    /// retries as an update.
    pub async fn upsert(&self, request: UpsertRequest) -> UpsertOutcome {
        let started = Instant::now();

        if let Err(message) = request.natural_key.validate() {
            return UpsertOutcome::failed(
                EngineError::validation("natural_key", message),
                Vec::new(),
            );
        }

        let (canonical, mut warnings) = canonicalize(&self.policy, &request.attributes);

        if let Err(err) = validate_required(&self.policy, &canonical) {
            return UpsertOutcome::failed(err, warnings);
        }

        let (record_ref, operation) =
            match self.run(&request, &canonical, &mut warnings).await {
                Ok(done) => done,
                Err(err) => return UpsertOutcome::failed(err, warnings),
            };

        let persisted_attributes = self.read_back(&record_ref, &mut warnings).await;

        info!(
            partition = %request.partition,
            natural_key = %request.natural_key,
            record_id = %record_ref,
            operation = %operation,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upsert completed"
        );

        UpsertOutcome {
            success: true,
            record_id: Some(record_ref),
            operation: Some(operation),
            persisted_attributes,
            warnings,
            error: None,
        }
    }

    async fn run(
        &self,
        request: &UpsertRequest,
        canonical: &CanonicalAttributes,
        warnings: &mut Vec<String>,
    ) -> EngineResult<(RecordRef, Operation)> {
        match resolve(self.store.as_ref(), &request.partition, &request.natural_key).await? {
            Resolution::Found(record_ref) => self
                .apply_update(record_ref, request, canonical, warnings)
                .await
                .map(|r| (r, Operation::Updated)),

            Resolution::NotFound => {
                let mut draft =
                    RecordDraft::new(request.partition.clone(), request.natural_key.clone());
                warnings.extend(reconcile(
                    &self.policy,
                    &mut draft,
                    canonical,
                    ReconcileMode::Create,
                ));
                self.apply_party_line(&mut draft, request);

                match self.store.create(draft).await {
                    Ok(record_ref) => Ok((record_ref, Operation::Created)),

                    Err(err) if err.is_uniqueness_conflict() => {
                        info!(
                            partition = %request.partition,
                            natural_key = %request.natural_key,
                            "create collided with a concurrent writer, retrying as update"
                        );
                        match resolve(
                            self.store.as_ref(),
                            &request.partition,
                            &request.natural_key,
                        )
                        .await?
                        {
                            Resolution::Found(record_ref) => self
                                .apply_update(record_ref, request, canonical, warnings)
                                .await
                                .map(|r| (r, Operation::Updated)),
                            // The colliding record is not findable yet;
                            // a second automatic retry is not taken.
                            Resolution::NotFound => Err(err.into()),
                        }
                    }

                    Err(err) => Err(err.into()),
                }
            }
        }
    }

    async fn apply_update(
        &self,
        record_ref: RecordRef,
        request: &UpsertRequest,
        canonical: &CanonicalAttributes,
        warnings: &mut Vec<String>,
    ) -> EngineResult<RecordRef> {
        let mut draft = self.store.load(&record_ref).await?;
        warnings.extend(reconcile(
            &self.policy,
            &mut draft,
            canonical,
            ReconcileMode::Update,
        ));
        self.apply_party_line(&mut draft, request);
        Ok(self.store.save(draft).await?)
    }

    fn apply_party_line(&self, draft: &mut RecordDraft, request: &UpsertRequest) {
        let Some(party) = &request.party_line else {
            return;
        };

        let mut payload = BTreeMap::new();
        if let Some(code) = &party.party_code {
            payload.insert(
                self.policy.party_code_field.clone(),
                AttributeValue::from(code.as_str()),
            );
        }

        reconcile_line(
            draft,
            &self.policy.party_collection,
            &self.policy.party_key_field,
            &AttributeValue::from(party.party_id),
            &payload,
            &self.policy.preferred_field,
        );
    }

    async fn read_back(
        &self,
        record_ref: &RecordRef,
        warnings: &mut Vec<String>,
    ) -> BTreeMap<String, AttributeValue> {
        match self.store.load(record_ref).await {
            Ok(record) => self
                .policy
                .required_specs()
                .filter_map(|spec| {
                    record
                        .attribute(&spec.name)
                        .map(|v| (spec.name.clone(), v.clone()))
                })
                .collect(),
            Err(err) => {
                warn!(
                    record_id = %record_ref,
                    error = %err,
                    "read-back after save failed"
                );
                warnings.push(format!("read-back after save failed: {err}"));
                BTreeMap::new()
            }
        }
    }
}
