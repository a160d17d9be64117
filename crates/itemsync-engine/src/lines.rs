//! Line-collection reconciler
//!
//! Merges one sub-collection entry into a record draft by matching a
//! designated key field: update the matching line in place if found,
//! append otherwise. This merge-by-key is what keeps repeated upserts
//! from appending duplicate lines indefinitely. The preferred flag is
//! forced true on the reconciled line and demoted on its siblings, so
//! at most one line per collection carries it.

use std::collections::BTreeMap;

use tracing::{debug, info};

use itemsync_store::record::{LineEntry, RecordDraft};
use itemsync_store::value::AttributeValue;

/// How the reconciled line landed in the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineOutcome {
    /// An existing line matched the key and was updated in place.
    Updated,
    /// No line matched; a new one was appended.
    Appended,
}

/// Compare two values as line keys.
///
/// Key fields arrive typed from some callers and stringly from others;
/// comparison is on the canonical display form so `12` matches `"12"`.
fn key_eq(a: &AttributeValue, b: &AttributeValue) -> bool {
    a == b || a.display_string() == b.display_string()
}

/// Merge one keyed entry into a named sub-collection of the draft.
///
/// Payload fields that are present overwrite the matching line's
/// fields; fields the payload omits keep their current value. The
/// `preferred_field` is always set true on the reconciled line and
/// false on every other line of the collection.
pub fn reconcile_line(
    target: &mut RecordDraft,
    collection: &str,
    key_field: &str,
    key_value: &AttributeValue,
    payload: &BTreeMap<String, AttributeValue>,
    preferred_field: &str,
) -> LineOutcome {
    let lines = target.sublist_mut(collection);

    let matched = lines
        .iter()
        .position(|line| line.get(key_field).is_some_and(|v| key_eq(v, key_value)));

    let (index, outcome) = match matched {
        Some(i) => {
            debug!(
                collection,
                key_field,
                key = %key_value,
                line = i,
                "matched existing line, updating in place"
            );
            (i, LineOutcome::Updated)
        }
        None => {
            let mut line = LineEntry::new();
            line.set(key_field, key_value.clone());
            lines.push(line);
            debug!(
                collection,
                key_field,
                key = %key_value,
                "no matching line, appending"
            );
            (lines.len() - 1, LineOutcome::Appended)
        }
    };

    for (name, value) in payload {
        if value.is_empty() {
            continue;
        }
        lines[index].set(name.clone(), value.clone());
    }

    // Single-preferred invariant: promote the reconciled line, demote
    // the rest.
    for (i, line) in lines.iter_mut().enumerate() {
        let preferred = i == index;
        let was_preferred = line
            .get(preferred_field)
            .and_then(AttributeValue::as_boolean)
            .unwrap_or(false);
        if was_preferred && !preferred {
            info!(
                collection,
                line = i,
                "demoting previously preferred line"
            );
        }
        line.set(preferred_field, preferred);
    }

    outcome
}
