//! Attribute value types
//!
//! Typed values carried by record attributes and sub-collection lines.

use serde::{Deserialize, Serialize};

/// A typed value for a record attribute.
///
/// External stores expose attributes in a handful of scalar shapes.
/// `Decimal` is carried as `f64`; `Text` holds free-form blobs (long
/// descriptions, notes) that are never parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A single string value.
    String(String),
    /// A single integer value.
    Integer(i64),
    /// A single boolean value.
    Boolean(bool),
    /// A decimal value.
    Decimal(f64),
    /// A raw text blob, never interpreted.
    Text(String),
}

impl AttributeValue {
    /// Get as a string slice if this is a string or text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::String(s) | AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get as an integer if this is an integer value.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            AttributeValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as a boolean if this is a boolean value.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            AttributeValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as a decimal if this is a decimal value.
    pub fn as_decimal(&self) -> Option<f64> {
        match self {
            AttributeValue::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    /// Check whether the value is an empty string or text blob.
    ///
    /// Empty values are treated as absent by reconciliation.
    pub fn is_empty(&self) -> bool {
        match self {
            AttributeValue::String(s) | AttributeValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Render the value as its canonical display string.
    ///
    /// Used for logging and for key-field comparison across typed and
    /// stringly-typed line entries.
    pub fn display_string(&self) -> String {
        match self {
            AttributeValue::String(s) | AttributeValue::Text(s) => s.clone(),
            AttributeValue::Integer(i) => i.to_string(),
            AttributeValue::Boolean(b) => b.to_string(),
            AttributeValue::Decimal(d) => d.to_string(),
        }
    }
}

impl std::fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::String(s)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::String(s.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        AttributeValue::Integer(i)
    }
}

impl From<i32> for AttributeValue {
    fn from(i: i32) -> Self {
        AttributeValue::Integer(i64::from(i))
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Boolean(b)
    }
}

impl From<f64> for AttributeValue {
    fn from(d: f64) -> Self {
        AttributeValue::Decimal(d)
    }
}
