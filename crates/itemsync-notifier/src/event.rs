//! Change event
//!
//! The immutable record of one qualifying mutation, emitted at most
//! once. Carries all changed attributes in a single event rather than
//! one event per attribute, plus the routing flag the consuming system
//! uses as its own loop guard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use itemsync_store::record::{NaturalKey, RecordRef};

use crate::diff::AttributeChange;
use crate::error::NotifierResult;

/// One outbound change notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// Unique identifier of this event instance, for consumer-side
    /// idempotence.
    pub event_id: Uuid,

    /// The mutated record.
    pub record_id: RecordRef,

    /// Business identifier of the mutated record.
    pub natural_key: NaturalKey,

    /// All watched attributes that changed, old and new values paired.
    pub changed_attributes: Vec<AttributeChange>,

    /// Routing flag forwarded from the record; tells the consumer
    /// whether to skip re-processing.
    pub routing_flag: bool,

    /// When the event was emitted.
    pub emitted_at: DateTime<Utc>,
}

impl ChangeEvent {
    /// Create a new event with a fresh id and the current timestamp.
    pub fn new(
        record_id: RecordRef,
        natural_key: NaturalKey,
        changed_attributes: Vec<AttributeChange>,
        routing_flag: bool,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            record_id,
            natural_key,
            changed_attributes,
            routing_flag,
            emitted_at: Utc::now(),
        }
    }

    /// Serialize the event to JSON bytes.
    pub fn to_json_bytes(&self) -> NotifierResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}
