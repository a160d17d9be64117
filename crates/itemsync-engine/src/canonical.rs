//! Boundary canonicalization
//!
//! Collapses the stringly-typed, alias-ridden inbound payload into a
//! canonical attribute map exactly once, before any business logic
//! runs. Alias precedence is fixed: the canonical name wins over every
//! alias, and an earlier alias wins over a later one; losing values are
//! logged and surfaced as warnings.

use std::collections::BTreeMap;

use tracing::debug;

use itemsync_store::value::AttributeValue;

use crate::policy::ReconciliationPolicy;

/// Attribute map keyed by canonical names, produced by
/// [`canonicalize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanonicalAttributes {
    attributes: BTreeMap<String, AttributeValue>,
}

impl CanonicalAttributes {
    /// Create an empty attribute map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an attribute value.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Check if an attribute is present.
    pub fn has(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Insert an attribute value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Iterate attributes in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.attributes.iter()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Check if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

impl FromIterator<(String, AttributeValue)> for CanonicalAttributes {
    fn from_iter<T: IntoIterator<Item = (String, AttributeValue)>>(iter: T) -> Self {
        Self {
            attributes: iter.into_iter().collect(),
        }
    }
}

/// Canonicalize a raw attribute payload against a policy.
///
/// Attribute names the policy does not know pass through unchanged —
/// the attribute set is open. Known names are rewritten to their
/// canonical form; when several spellings of one attribute appear in a
/// single payload the fixed precedence picks the survivor and the
/// discarded spellings are reported as warnings.
pub fn canonicalize(
    policy: &ReconciliationPolicy,
    raw: &BTreeMap<String, AttributeValue>,
) -> (CanonicalAttributes, Vec<String>) {
    let mut canonical = CanonicalAttributes::new();
    let mut warnings = Vec::new();

    // (canonical name, precedence rank of the spelling that produced it)
    let mut ranks: BTreeMap<String, usize> = BTreeMap::new();

    for (name, value) in raw {
        let Some(spec) = policy.resolve_name(name) else {
            canonical.insert(name.clone(), value.clone());
            continue;
        };

        // rank 0 = canonical name, 1.. = alias position
        let rank = if name == &spec.name {
            0
        } else {
            1 + spec
                .aliases
                .iter()
                .position(|a| a == name)
                .unwrap_or(spec.aliases.len())
        };

        match ranks.get(&spec.name) {
            Some(&existing) if existing <= rank => {
                debug!(
                    attribute = %spec.name,
                    losing_alias = %name,
                    "alias discarded by precedence"
                );
                warnings.push(format!(
                    "alias '{name}' for '{}' discarded by precedence",
                    spec.name
                ));
            }
            Some(_) => {
                debug!(
                    attribute = %spec.name,
                    winning_alias = %name,
                    "alias superseded by higher-precedence spelling"
                );
                warnings.push(format!(
                    "alias value for '{}' replaced by '{name}'",
                    spec.name
                ));
                ranks.insert(spec.name.clone(), rank);
                canonical.insert(spec.name.clone(), value.clone());
            }
            None => {
                ranks.insert(spec.name.clone(), rank);
                canonical.insert(spec.name.clone(), value.clone());
            }
        }
    }

    (canonical, warnings)
}
