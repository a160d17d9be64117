//! Reconciliation policy
//!
//! Table-driven description of how each attribute is reconciled:
//! expected type, alias precedence, required/create-only flags. The
//! behavioral differences between entity variants live in this data,
//! not in code; the policy carries a version so variants can evolve
//! independently.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Expected type of an attribute, driving coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    /// Plain string.
    String,
    /// Integer; numeric strings are coerced.
    Integer,
    /// Boolean; `"true"/"1"/"y"` string forms are coerced.
    Boolean,
    /// Decimal; numeric strings are coerced.
    Decimal,
    /// Free-form text blob, stored as-is.
    Text,
}

impl AttributeKind {
    /// Get the string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeKind::String => "string",
            AttributeKind::Integer => "integer",
            AttributeKind::Boolean => "boolean",
            AttributeKind::Decimal => "decimal",
            AttributeKind::Text => "text",
        }
    }
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AttributeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" => Ok(AttributeKind::String),
            "integer" => Ok(AttributeKind::Integer),
            "boolean" => Ok(AttributeKind::Boolean),
            "decimal" => Ok(AttributeKind::Decimal),
            "text" => Ok(AttributeKind::Text),
            _ => Err(format!("unknown attribute kind: {s}")),
        }
    }
}

/// Reconciliation rule for one canonical attribute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeSpec {
    /// Canonical attribute name. Wins over any alias when both appear
    /// in one payload.
    pub name: String,

    /// Expected type.
    pub kind: AttributeKind,

    /// Legacy aliases, in precedence order. An earlier alias wins over
    /// a later one; the canonical name wins over all of them.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,

    /// Whether the attribute must be present and valid for any upsert.
    #[serde(default)]
    pub required: bool,

    /// Whether a required integer must be positive and non-zero.
    #[serde(default)]
    pub positive: bool,

    /// Whether the attribute may only be set at creation. The store
    /// forbids changing these post-creation, so updates skip them even
    /// when present in the payload.
    #[serde(default)]
    pub create_only: bool,

    /// Maximum accepted length for string values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
}

impl AttributeSpec {
    /// Create a new optional attribute spec.
    pub fn new(name: impl Into<String>, kind: AttributeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            aliases: Vec::new(),
            required: false,
            positive: false,
            create_only: false,
            max_len: None,
        }
    }

    /// Add a legacy alias.
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Mark the attribute required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Require a positive non-zero integer value.
    #[must_use]
    pub fn positive(mut self) -> Self {
        self.positive = true;
        self
    }

    /// Mark the attribute settable only at creation.
    #[must_use]
    pub fn create_only(mut self) -> Self {
        self.create_only = true;
        self
    }

    /// Cap the accepted string length.
    #[must_use]
    pub fn max_len(mut self, len: usize) -> Self {
        self.max_len = Some(len);
        self
    }
}

/// Versioned, table-driven reconciliation policy for one entity type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationPolicy {
    /// Policy version; bumped when the attribute table changes shape.
    pub version: u32,

    /// Entity type this policy reconciles.
    pub entity: String,

    /// Attribute rules.
    pub attributes: Vec<AttributeSpec>,

    /// Name of the associated-party sub-collection.
    pub party_collection: String,

    /// Key field matched when merging party lines.
    pub party_key_field: String,

    /// Payload field carrying the party code.
    pub party_code_field: String,

    /// Boolean field forced true on the reconciled party line.
    pub preferred_field: String,
}

impl ReconciliationPolicy {
    /// Look up the spec for a canonical attribute name.
    pub fn spec(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes.iter().find(|s| s.name == name)
    }

    /// Resolve an incoming attribute name to its canonical spec.
    ///
    /// Matches the canonical name first, then aliases.
    pub fn resolve_name(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes
            .iter()
            .find(|s| s.name == name || s.aliases.iter().any(|a| a == name))
    }

    /// Iterate the required attribute specs in table order.
    pub fn required_specs(&self) -> impl Iterator<Item = &AttributeSpec> {
        self.attributes.iter().filter(|s| s.required)
    }

    /// Default policy for the item entity, version 1.
    pub fn default_item() -> Self {
        Self {
            version: 1,
            entity: "item".to_string(),
            attributes: vec![
                AttributeSpec::new("origin_item_id", AttributeKind::Integer)
                    .with_alias("source_item_id")
                    .required()
                    .positive(),
                AttributeSpec::new("origin_company_id", AttributeKind::Integer)
                    .with_alias("source_company_id")
                    .required()
                    .positive(),
                AttributeSpec::new("upc_code", AttributeKind::String)
                    .with_alias("upc")
                    .required()
                    .max_len(20),
                AttributeSpec::new("description", AttributeKind::String)
                    .with_alias("sales_description"),
                AttributeSpec::new("purchase_description", AttributeKind::String),
                AttributeSpec::new("vendor_name", AttributeKind::String),
                AttributeSpec::new("unit_type", AttributeKind::String).create_only(),
                AttributeSpec::new("base_price", AttributeKind::Decimal),
                AttributeSpec::new("reorder_point", AttributeKind::Decimal),
                AttributeSpec::new("safety_stock_level", AttributeKind::Decimal),
                AttributeSpec::new("lead_time_days", AttributeKind::Integer),
                AttributeSpec::new("weight", AttributeKind::Decimal),
                AttributeSpec::new("is_inactive", AttributeKind::Boolean).with_alias("inactive"),
                AttributeSpec::new("is_dropship", AttributeKind::Boolean),
                AttributeSpec::new("notes", AttributeKind::Text),
            ],
            party_collection: "party_lines".to_string(),
            party_key_field: "party_id".to_string(),
            party_code_field: "party_code".to_string(),
            preferred_field: "preferred".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_name_canonical_and_alias() {
        let policy = ReconciliationPolicy::default_item();
        assert_eq!(policy.resolve_name("description").unwrap().name, "description");
        assert_eq!(
            policy.resolve_name("sales_description").unwrap().name,
            "description"
        );
        assert!(policy.resolve_name("no_such_attribute").is_none());
    }

    #[test]
    fn test_required_specs() {
        let policy = ReconciliationPolicy::default_item();
        let required: Vec<&str> = policy.required_specs().map(|s| s.name.as_str()).collect();
        assert_eq!(
            required,
            vec!["origin_item_id", "origin_company_id", "upc_code"]
        );
    }

    #[test]
    fn test_create_only_flag() {
        let policy = ReconciliationPolicy::default_item();
        assert!(policy.spec("unit_type").unwrap().create_only);
        assert!(!policy.spec("base_price").unwrap().create_only);
    }

    #[test]
    fn test_policy_round_trips_as_data() {
        let policy = ReconciliationPolicy::default_item();
        let json = serde_json::to_string(&policy).unwrap();
        let parsed: ReconciliationPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.version, 1);
        assert_eq!(parsed.attributes.len(), policy.attributes.len());
        assert_eq!(parsed.party_key_field, "party_id");
    }
}
