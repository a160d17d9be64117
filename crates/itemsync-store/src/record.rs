//! Record identity and draft types
//!
//! Newtype wrappers for record identity plus the mutable working copy
//! used for create and update operations.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::AttributeValue;

/// Maximum length of a natural key.
pub const MAX_NATURAL_KEY_LEN: usize = 40;

/// A scoping partition for record lookups (tenant, subsidiary).
///
/// Every lookup is scoped to a partition; two records with the same
/// natural key in different partitions are unrelated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Partition(String);

impl Partition {
    /// Create a new partition identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Business identifier for a logical item within a partition.
///
/// At steady state at most one external record exists per
/// (partition, natural key) pair; transient duplicates caused by
/// concurrent create races are resolved by the caller's retry, not by
/// the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NaturalKey(String);

impl NaturalKey {
    /// Create a natural key without validation.
    ///
    /// Boundary validation (non-empty, length cap) is the caller's
    /// responsibility; see [`NaturalKey::validate`].
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Check boundary constraints: non-empty and at most
    /// [`MAX_NATURAL_KEY_LEN`] characters.
    pub fn validate(&self) -> Result<(), String> {
        if self.0.is_empty() {
            return Err("natural key must not be empty".to_string());
        }
        if self.0.chars().count() > MAX_NATURAL_KEY_LEN {
            return Err(format!(
                "natural key exceeds {MAX_NATURAL_KEY_LEN} characters"
            ));
        }
        Ok(())
    }

    /// Get the inner key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque store-assigned reference to a persisted record.
///
/// Assigned on creation and immutable thereafter. Ordered so that
/// ambiguous lookup results can be tie-broken deterministically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordRef(String);

impl RecordRef {
    /// Create a record reference from a store-assigned id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of a named sub-collection, keyed by a designated field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineEntry {
    #[serde(flatten)]
    fields: BTreeMap<String, AttributeValue>,
}

impl LineEntry {
    /// Create a new empty line entry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Set a field using builder pattern.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Get a field value.
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.fields.get(name)
    }

    /// Iterate over all fields.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.fields.iter()
    }
}

/// Mutable working copy of an external record.
///
/// A draft with no [`RecordRef`] has not been persisted yet; the store
/// assigns the reference on create. All attribute and sub-collection
/// edits happen on the in-memory draft and reach the store only through
/// a single save, which is what makes the reconcilers'
/// read-modify-write window safe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordDraft {
    /// Store-assigned reference; `None` until first persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_ref: Option<RecordRef>,

    /// Scoping partition.
    pub partition: Partition,

    /// Business identifier within the partition.
    pub natural_key: NaturalKey,

    /// Scalar attributes.
    pub attributes: BTreeMap<String, AttributeValue>,

    /// Named sub-collections of keyed line entries.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sublists: BTreeMap<String, Vec<LineEntry>>,
}

impl RecordDraft {
    /// Create a new unpersisted draft.
    pub fn new(partition: Partition, natural_key: NaturalKey) -> Self {
        Self {
            record_ref: None,
            partition,
            natural_key,
            attributes: BTreeMap::new(),
            sublists: BTreeMap::new(),
        }
    }

    /// Set an attribute value.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Set an attribute using builder pattern.
    #[must_use]
    pub fn with_attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Self {
        self.set_attribute(name, value);
        self
    }

    /// Get an attribute value.
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Check if an attribute is set.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Get the entries of a named sub-collection, empty if absent.
    pub fn sublist(&self, name: &str) -> &[LineEntry] {
        self.sublists.get(name).map_or(&[], Vec::as_slice)
    }

    /// Get a mutable handle to a named sub-collection, creating it if
    /// absent.
    pub fn sublist_mut(&mut self, name: &str) -> &mut Vec<LineEntry> {
        self.sublists.entry(name.to_string()).or_default()
    }
}
