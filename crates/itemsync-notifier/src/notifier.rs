//! Outbound notifier
//!
//! Runs after an external-side mutation: classify the origin, filter
//! the operation type, diff the watched attributes, and emit at most
//! one change event. The classification step is what breaks the
//! synchronization feedback loop — this engine's own writes carry a
//! programmatic origin and are filtered before any diffing happens.
//!
//! A notification failure must never fail or roll back the mutation
//! that triggered it, so every error on this path is caught, logged,
//! and swallowed.

use tracing::{debug, error, info};

use crate::context::{MutationContext, MutationKind};
use crate::delivery::ChangeEventSink;
use crate::diff::{diff_watched, WatchedAttribute};
use crate::event::ChangeEvent;

/// Evaluates mutations and emits qualifying change events to a sink.
pub struct OutboundNotifier<S> {
    sink: S,
    watched: Vec<WatchedAttribute>,
}

impl<S: ChangeEventSink> OutboundNotifier<S> {
    /// Create a notifier over a sink with the given watchlist.
    pub fn new(sink: S, watched: Vec<WatchedAttribute>) -> Self {
        Self { sink, watched }
    }

    /// The sink events are delivered to.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Evaluate one mutation without delivering.
    ///
    /// Returns the event that would be emitted, or `None` when the
    /// mutation does not qualify: programmatic origin, non-edit
    /// operation, or no watched attribute actually changed.
    pub fn evaluate(&self, context: &MutationContext) -> Option<ChangeEvent> {
        if !context.origin.is_interactive() {
            debug!(
                record_id = %context.record_id,
                origin = %context.origin,
                "programmatic origin, skipping"
            );
            return None;
        }

        if context.kind != MutationKind::Edit {
            debug!(
                record_id = %context.record_id,
                kind = %context.kind,
                "not an edit, skipping"
            );
            return None;
        }

        let changes = diff_watched(&self.watched, &context.prior, &context.current);
        if changes.is_empty() {
            debug!(
                record_id = %context.record_id,
                "no watched attribute changed, skipping"
            );
            return None;
        }

        Some(ChangeEvent::new(
            context.record_id.clone(),
            context.natural_key.clone(),
            changes,
            context.routing_flag,
        ))
    }

    /// Evaluate one mutation and deliver the event if it qualifies.
    ///
    /// Never fails: delivery errors are logged and swallowed.
    pub async fn notify(&self, context: &MutationContext) {
        let Some(event) = self.evaluate(context) else {
            return;
        };

        info!(
            event_id = %event.event_id,
            record_id = %event.record_id,
            changed = event.changed_attributes.len(),
            "emitting change event"
        );

        if let Err(err) = self.sink.deliver(&event).await {
            error!(
                event_id = %event.event_id,
                record_id = %event.record_id,
                error = %err,
                "change event delivery failed, swallowing"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::MutationOrigin;
    use crate::delivery::MemorySink;
    use crate::diff::default_item_watchlist;
    use itemsync_store::record::{NaturalKey, RecordRef};

    fn notifier() -> OutboundNotifier<MemorySink> {
        OutboundNotifier::new(MemorySink::new(), default_item_watchlist())
    }

    fn edit_context(origin: MutationOrigin) -> MutationContext {
        MutationContext::new(
            RecordRef::new("rec-1"),
            NaturalKey::new("ITEM-001"),
            origin,
            MutationKind::Edit,
        )
        .with_prior("base_price", 10.0)
        .with_current("base_price", 12.5)
    }

    #[test]
    fn test_evaluate_qualifying_edit() {
        let event = notifier()
            .evaluate(&edit_context(MutationOrigin::UserInterface))
            .unwrap();
        assert_eq!(event.changed_attributes.len(), 1);
        assert_eq!(event.changed_attributes[0].name, "base_price");
    }

    #[test]
    fn test_programmatic_origins_never_qualify() {
        let n = notifier();
        for origin in [
            MutationOrigin::Api,
            MutationOrigin::Import,
            MutationOrigin::Scheduled,
            MutationOrigin::Workflow,
        ] {
            assert!(n.evaluate(&edit_context(origin)).is_none());
        }
    }

    #[test]
    fn test_create_and_delete_never_qualify() {
        let n = notifier();
        for kind in [MutationKind::Create, MutationKind::Delete] {
            let mut ctx = edit_context(MutationOrigin::UserInterface);
            ctx.kind = kind;
            assert!(n.evaluate(&ctx).is_none());
        }
    }

    #[test]
    fn test_routing_flag_is_forwarded() {
        let ctx = edit_context(MutationOrigin::UserInterface).with_routing_flag(true);
        let event = notifier().evaluate(&ctx).unwrap();
        assert!(event.routing_flag);
    }
}
