//! Watched-attribute diffing
//!
//! Compares each watched attribute's prior and new value. Numeric
//! attributes are compared as parsed numbers with missing or
//! unparsable values defaulting to zero, so `"10"` against `10.0` is
//! not a change — string formatting differences must never produce
//! false positives.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use itemsync_store::value::AttributeValue;

/// One watched attribute and how it is compared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchedAttribute {
    /// Attribute name.
    pub name: String,

    /// Compare as parsed numbers instead of strings.
    #[serde(default)]
    pub numeric: bool,
}

impl WatchedAttribute {
    /// Watch an attribute with numeric comparison.
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            numeric: true,
        }
    }

    /// Watch an attribute with string comparison.
    pub fn textual(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            numeric: false,
        }
    }
}

/// Default watched set for the item entity.
pub fn default_item_watchlist() -> Vec<WatchedAttribute> {
    vec![
        WatchedAttribute::numeric("base_price"),
        WatchedAttribute::numeric("reorder_point"),
        WatchedAttribute::numeric("safety_stock_level"),
        WatchedAttribute::numeric("lead_time_days"),
        WatchedAttribute::textual("vendor_name"),
    ]
}

/// A single attribute difference carried by a change event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeChange {
    /// Attribute name.
    pub name: String,

    /// Value before the mutation, as observed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<AttributeValue>,

    /// Value after the mutation, as observed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<AttributeValue>,
}

/// Parse a value as a number, defaulting missing and unparsable
/// values to zero.
pub fn numeric_value(value: Option<&AttributeValue>) -> f64 {
    match value {
        Some(AttributeValue::Decimal(d)) => *d,
        Some(AttributeValue::Integer(i)) => *i as f64,
        Some(AttributeValue::Boolean(_)) | None => 0.0,
        Some(AttributeValue::String(s)) | Some(AttributeValue::Text(s)) => {
            s.trim().parse().unwrap_or(0.0)
        }
    }
}

fn textual_value(value: Option<&AttributeValue>) -> String {
    value.map(AttributeValue::display_string).unwrap_or_default()
}

/// Diff the watched attributes between two attribute views.
///
/// Returns one [`AttributeChange`] per attribute that actually
/// differs; an empty result means the mutation is not worth an event.
pub fn diff_watched(
    watched: &[WatchedAttribute],
    prior: &BTreeMap<String, AttributeValue>,
    current: &BTreeMap<String, AttributeValue>,
) -> Vec<AttributeChange> {
    let mut changes = Vec::new();

    for attr in watched {
        let old = prior.get(&attr.name);
        let new = current.get(&attr.name);

        let differs = if attr.numeric {
            numeric_value(old) != numeric_value(new)
        } else {
            textual_value(old) != textual_value(new)
        };

        if differs {
            debug!(
                attribute = %attr.name,
                old = ?old,
                new = ?new,
                "watched attribute changed"
            );
            changes.push(AttributeChange {
                name: attr.name.clone(),
                old_value: old.cloned(),
                new_value: new.cloned(),
            });
        }
    }

    changes
}
