//! Attribute reconciler
//!
//! Applies a canonical attribute set to a record draft under the
//! set-if-present policy: an attribute is written only when the
//! canonical value is present and non-empty, which is what makes
//! partial payloads safe on update. Per-attribute coercion failures
//! are isolated — logged, accumulated as warnings, never fatal. The
//! only fatal outcome is a required-attribute validation failure,
//! raised before any write is attempted.

use tracing::{debug, warn};

use itemsync_store::record::RecordDraft;
use itemsync_store::value::AttributeValue;

use crate::canonical::CanonicalAttributes;
use crate::error::{EngineError, EngineResult};
use crate::policy::{AttributeKind, ReconciliationPolicy};

/// Whether the target record is being created or updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileMode {
    /// First write of a new record.
    Create,
    /// Mutation of an existing record.
    Update,
}

/// Coerce a value to boolean.
///
/// Accepts a boolean, or the string forms `"true"`, `"1"`, `"y"`
/// (case-insensitive) as true and `"false"`, `"0"`, `"n"` as false.
pub fn coerce_boolean(value: &AttributeValue) -> Option<bool> {
    match value {
        AttributeValue::Boolean(b) => Some(*b),
        AttributeValue::String(s) | AttributeValue::Text(s) => {
            match s.trim().to_lowercase().as_str() {
                "true" | "1" | "y" => Some(true),
                "false" | "0" | "n" => Some(false),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Coerce a value to integer.
///
/// Accepts an integer, a whole-valued decimal, or a numeric string.
pub fn coerce_integer(value: &AttributeValue) -> Option<i64> {
    match value {
        AttributeValue::Integer(i) => Some(*i),
        AttributeValue::Decimal(d) if d.fract() == 0.0 => Some(*d as i64),
        AttributeValue::String(s) | AttributeValue::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coerce a value to decimal.
///
/// Accepts a decimal, an integer, or a numeric string.
pub fn coerce_decimal(value: &AttributeValue) -> Option<f64> {
    match value {
        AttributeValue::Decimal(d) => Some(*d),
        AttributeValue::Integer(i) => Some(*i as f64),
        AttributeValue::String(s) | AttributeValue::Text(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Validate the required attributes of a canonical set.
///
/// Required attributes must be present and non-empty; required
/// integers flagged positive must parse to a positive non-zero value.
/// The first failure aborts the whole upsert before any write.
pub fn validate_required(
    policy: &ReconciliationPolicy,
    canonical: &CanonicalAttributes,
) -> EngineResult<()> {
    for spec in policy.required_specs() {
        let value = match canonical.get(&spec.name) {
            Some(v) if !v.is_empty() => v,
            _ => {
                return Err(EngineError::validation(
                    &spec.name,
                    "required attribute is missing",
                ));
            }
        };

        match spec.kind {
            AttributeKind::Integer => {
                let parsed = coerce_integer(value).ok_or_else(|| {
                    EngineError::validation(
                        &spec.name,
                        format!("'{value}' is not a valid integer"),
                    )
                })?;
                if spec.positive && parsed <= 0 {
                    return Err(EngineError::validation(
                        &spec.name,
                        format!("must be a positive integer, got {parsed}"),
                    ));
                }
            }
            _ => {
                if let Some(max) = spec.max_len {
                    let len = value.display_string().chars().count();
                    if len > max {
                        return Err(EngineError::validation(
                            &spec.name,
                            format!("exceeds {max} characters"),
                        ));
                    }
                }
            }
        }
    }
    Ok(())
}

/// Apply a canonical attribute set to a draft.
///
/// Mutates `target` in place and returns the per-attribute warnings
/// accumulated along the way. Never fails: fatal validation happens
/// in [`validate_required`] before this runs.
pub fn reconcile(
    policy: &ReconciliationPolicy,
    target: &mut RecordDraft,
    canonical: &CanonicalAttributes,
    mode: ReconcileMode,
) -> Vec<String> {
    let mut warnings = Vec::new();

    for (name, value) in canonical.iter() {
        // Set-if-present: absent attributes were never in the map;
        // empty values leave the target untouched.
        if value.is_empty() {
            debug!(attribute = %name, "empty value, leaving target untouched");
            continue;
        }

        let Some(spec) = policy.spec(name) else {
            // Open attribute set: unknown names are written as-is.
            target.set_attribute(name.clone(), value.clone());
            continue;
        };

        if spec.create_only && mode == ReconcileMode::Update {
            debug!(
                attribute = %name,
                "create-only attribute skipped on update"
            );
            continue;
        }

        let coerced = match spec.kind {
            AttributeKind::Boolean => coerce_boolean(value).map(AttributeValue::Boolean),
            AttributeKind::Integer => coerce_integer(value).map(AttributeValue::Integer),
            AttributeKind::Decimal => coerce_decimal(value).map(AttributeValue::Decimal),
            AttributeKind::String => Some(AttributeValue::String(value.display_string())),
            AttributeKind::Text => Some(AttributeValue::Text(value.display_string())),
        };

        match coerced {
            Some(v) => {
                if let (Some(max), Some(s)) = (spec.max_len, v.as_str()) {
                    if s.chars().count() > max {
                        warn!(
                            attribute = %name,
                            max_len = max,
                            "value exceeds maximum length, skipped"
                        );
                        warnings.push(format!("'{name}' exceeds {max} characters, skipped"));
                        continue;
                    }
                }
                target.set_attribute(name.clone(), v);
            }
            None => {
                warn!(
                    attribute = %name,
                    kind = %spec.kind,
                    value = %value,
                    "value failed coercion, skipped"
                );
                warnings.push(format!(
                    "'{name}' could not be coerced to {}: '{value}', skipped",
                    spec.kind
                ));
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use itemsync_store::record::{NaturalKey, Partition};

    fn empty_draft() -> RecordDraft {
        RecordDraft::new(Partition::new("p1"), NaturalKey::new("ITEM-001"))
    }

    fn canonical(pairs: &[(&str, AttributeValue)]) -> CanonicalAttributes {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_coerce_boolean_forms() {
        assert_eq!(coerce_boolean(&AttributeValue::from(true)), Some(true));
        assert_eq!(coerce_boolean(&AttributeValue::from("TRUE")), Some(true));
        assert_eq!(coerce_boolean(&AttributeValue::from("1")), Some(true));
        assert_eq!(coerce_boolean(&AttributeValue::from("Y")), Some(true));
        assert_eq!(coerce_boolean(&AttributeValue::from("false")), Some(false));
        assert_eq!(coerce_boolean(&AttributeValue::from("0")), Some(false));
        assert_eq!(coerce_boolean(&AttributeValue::from("maybe")), None);
        assert_eq!(coerce_boolean(&AttributeValue::from(1i64)), None);
    }

    #[test]
    fn test_coerce_integer_forms() {
        assert_eq!(coerce_integer(&AttributeValue::from(7i64)), Some(7));
        assert_eq!(coerce_integer(&AttributeValue::from("42")), Some(42));
        assert_eq!(coerce_integer(&AttributeValue::from(" 42 ")), Some(42));
        assert_eq!(coerce_integer(&AttributeValue::from(3.0)), Some(3));
        assert_eq!(coerce_integer(&AttributeValue::from(3.5)), None);
        assert_eq!(coerce_integer(&AttributeValue::from("abc")), None);
    }

    #[test]
    fn test_coerce_decimal_forms() {
        assert_eq!(coerce_decimal(&AttributeValue::from(1.5)), Some(1.5));
        assert_eq!(coerce_decimal(&AttributeValue::from(3i64)), Some(3.0));
        assert_eq!(coerce_decimal(&AttributeValue::from("10.25")), Some(10.25));
        assert_eq!(coerce_decimal(&AttributeValue::from("x")), None);
    }

    #[test]
    fn test_validate_required_missing_field() {
        let policy = ReconciliationPolicy::default_item();
        let err = validate_required(
            &policy,
            &canonical(&[
                ("origin_company_id", AttributeValue::from(2i64)),
                ("upc_code", AttributeValue::from("X")),
            ]),
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("origin_item_id"));
    }

    #[test]
    fn test_validate_required_rejects_non_positive() {
        let policy = ReconciliationPolicy::default_item();
        let err = validate_required(
            &policy,
            &canonical(&[
                ("origin_item_id", AttributeValue::from(0i64)),
                ("origin_company_id", AttributeValue::from(2i64)),
                ("upc_code", AttributeValue::from("X")),
            ]),
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("origin_item_id"));
    }

    #[test]
    fn test_validate_required_accepts_numeric_strings() {
        let policy = ReconciliationPolicy::default_item();
        validate_required(
            &policy,
            &canonical(&[
                ("origin_item_id", AttributeValue::from("7")),
                ("origin_company_id", AttributeValue::from("2")),
                ("upc_code", AttributeValue::from("X")),
            ]),
        )
        .unwrap();
    }

    #[test]
    fn test_validate_required_enforces_max_len() {
        let policy = ReconciliationPolicy::default_item();
        let err = validate_required(
            &policy,
            &canonical(&[
                ("origin_item_id", AttributeValue::from(1i64)),
                ("origin_company_id", AttributeValue::from(2i64)),
                ("upc_code", AttributeValue::from("X".repeat(21).as_str())),
            ]),
        )
        .unwrap_err();
        assert_eq!(err.field(), Some("upc_code"));
    }

    #[test]
    fn test_set_if_present_leaves_absent_untouched() {
        let policy = ReconciliationPolicy::default_item();
        let mut draft = empty_draft();
        draft.set_attribute("description", "existing");

        reconcile(
            &policy,
            &mut draft,
            &canonical(&[("base_price", AttributeValue::from(9.99))]),
            ReconcileMode::Update,
        );

        assert_eq!(
            draft.attribute("description").and_then(|v| v.as_str()),
            Some("existing")
        );
        assert_eq!(
            draft.attribute("base_price").and_then(|v| v.as_decimal()),
            Some(9.99)
        );
    }

    #[test]
    fn test_empty_value_leaves_target_untouched() {
        let policy = ReconciliationPolicy::default_item();
        let mut draft = empty_draft();
        draft.set_attribute("description", "existing");

        reconcile(
            &policy,
            &mut draft,
            &canonical(&[("description", AttributeValue::from(""))]),
            ReconcileMode::Update,
        );

        assert_eq!(
            draft.attribute("description").and_then(|v| v.as_str()),
            Some("existing")
        );
    }

    #[test]
    fn test_create_only_skipped_on_update() {
        let policy = ReconciliationPolicy::default_item();

        let mut created = empty_draft();
        reconcile(
            &policy,
            &mut created,
            &canonical(&[("unit_type", AttributeValue::from("each"))]),
            ReconcileMode::Create,
        );
        assert_eq!(
            created.attribute("unit_type").and_then(|v| v.as_str()),
            Some("each")
        );

        let mut updated = empty_draft();
        updated.set_attribute("unit_type", "each");
        reconcile(
            &policy,
            &mut updated,
            &canonical(&[("unit_type", AttributeValue::from("pair"))]),
            ReconcileMode::Update,
        );
        assert_eq!(
            updated.attribute("unit_type").and_then(|v| v.as_str()),
            Some("each")
        );
    }

    #[test]
    fn test_unparsable_numeric_is_skipped_with_warning() {
        let policy = ReconciliationPolicy::default_item();
        let mut draft = empty_draft();

        let warnings = reconcile(
            &policy,
            &mut draft,
            &canonical(&[("base_price", AttributeValue::from("not-a-number"))]),
            ReconcileMode::Create,
        );

        assert!(!draft.has_attribute("base_price"));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("base_price"));
    }

    #[test]
    fn test_boolean_string_coercion_applied() {
        let policy = ReconciliationPolicy::default_item();
        let mut draft = empty_draft();

        reconcile(
            &policy,
            &mut draft,
            &canonical(&[("is_inactive", AttributeValue::from("Y"))]),
            ReconcileMode::Create,
        );

        assert_eq!(
            draft.attribute("is_inactive").and_then(|v| v.as_boolean()),
            Some(true)
        );
    }
}
