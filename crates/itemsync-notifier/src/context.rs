//! Mutation context
//!
//! Explicit description of one external-side mutation: who caused it,
//! what kind of edit it was, and the attribute values before and
//! after. Passed into the notifier as a parameter — never read from
//! ambient platform state — so classification is independently
//! testable.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use itemsync_store::record::{NaturalKey, RecordRef};
use itemsync_store::value::AttributeValue;

/// What kind of actor or process produced a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOrigin {
    /// A human editing through the interactive UI.
    UserInterface,
    /// A programmatic API call — including this engine's own writes.
    Api,
    /// Bulk import job.
    Import,
    /// Scheduled background job.
    Scheduled,
    /// Workflow or automation action.
    Workflow,
}

impl MutationOrigin {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationOrigin::UserInterface => "user_interface",
            MutationOrigin::Api => "api",
            MutationOrigin::Import => "import",
            MutationOrigin::Scheduled => "scheduled",
            MutationOrigin::Workflow => "workflow",
        }
    }

    /// Only human-interactive edits qualify for outbound notification;
    /// every programmatic origin is filtered, which is what breaks the
    /// synchronization feedback loop.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        matches!(self, MutationOrigin::UserInterface)
    }
}

impl fmt::Display for MutationOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MutationOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user_interface" => Ok(MutationOrigin::UserInterface),
            "api" => Ok(MutationOrigin::Api),
            "import" => Ok(MutationOrigin::Import),
            "scheduled" => Ok(MutationOrigin::Scheduled),
            "workflow" => Ok(MutationOrigin::Workflow),
            _ => Err(format!("unknown mutation origin: {s}")),
        }
    }
}

/// Operation type of a mutation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    /// Record creation.
    Create,
    /// Record edit. The only kind that is diffed.
    Edit,
    /// Record deletion.
    Delete,
}

impl MutationKind {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Edit => "edit",
            MutationKind::Delete => "delete",
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One external-side mutation, fully described.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationContext {
    /// The mutated record.
    pub record_id: RecordRef,

    /// Business identifier of the mutated record.
    pub natural_key: NaturalKey,

    /// Who caused the mutation.
    pub origin: MutationOrigin,

    /// What kind of mutation it was.
    pub kind: MutationKind,

    /// Routing flag read from the record, forwarded on emitted events
    /// so the consuming system can apply its own loop guard.
    #[serde(default)]
    pub routing_flag: bool,

    /// Watched-attribute values before the mutation.
    #[serde(default)]
    pub prior: BTreeMap<String, AttributeValue>,

    /// Watched-attribute values after the mutation.
    #[serde(default)]
    pub current: BTreeMap<String, AttributeValue>,
}

impl MutationContext {
    /// Create a context with empty attribute views.
    pub fn new(
        record_id: RecordRef,
        natural_key: NaturalKey,
        origin: MutationOrigin,
        kind: MutationKind,
    ) -> Self {
        Self {
            record_id,
            natural_key,
            origin,
            kind,
            routing_flag: false,
            prior: BTreeMap::new(),
            current: BTreeMap::new(),
        }
    }

    /// Set the routing flag.
    #[must_use]
    pub fn with_routing_flag(mut self, flag: bool) -> Self {
        self.routing_flag = flag;
        self
    }

    /// Record an attribute's value before the mutation.
    #[must_use]
    pub fn with_prior(
        mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.prior.insert(name.into(), value.into());
        self
    }

    /// Record an attribute's value after the mutation.
    #[must_use]
    pub fn with_current(
        mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.current.insert(name.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_user_interface_is_interactive() {
        assert!(MutationOrigin::UserInterface.is_interactive());
        assert!(!MutationOrigin::Api.is_interactive());
        assert!(!MutationOrigin::Import.is_interactive());
        assert!(!MutationOrigin::Scheduled.is_interactive());
        assert!(!MutationOrigin::Workflow.is_interactive());
    }

    #[test]
    fn test_origin_round_trip() {
        for origin in [
            MutationOrigin::UserInterface,
            MutationOrigin::Api,
            MutationOrigin::Import,
            MutationOrigin::Scheduled,
            MutationOrigin::Workflow,
        ] {
            assert_eq!(origin.as_str().parse::<MutationOrigin>().unwrap(), origin);
        }
        assert!("martian".parse::<MutationOrigin>().is_err());
    }

    #[test]
    fn test_context_builder() {
        let ctx = MutationContext::new(
            RecordRef::new("rec-1"),
            NaturalKey::new("ITEM-001"),
            MutationOrigin::UserInterface,
            MutationKind::Edit,
        )
        .with_routing_flag(true)
        .with_prior("base_price", 10.0)
        .with_current("base_price", 12.5);

        assert!(ctx.routing_flag);
        assert_eq!(
            ctx.prior.get("base_price").and_then(|v| v.as_decimal()),
            Some(10.0)
        );
        assert_eq!(
            ctx.current.get("base_price").and_then(|v| v.as_decimal()),
            Some(12.5)
        );
    }
}
