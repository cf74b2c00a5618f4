//! Index mapping types.
//!
//! This module defines the schema applied to a destination index: a map from field name
//! to one of a small closed set of storage types. Some fields are pinned to a type and
//! can never be reassigned afterwards.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Value};

/// Name of the exact-match sub-field attached to every text field.
pub const RAW_SUBFIELD: &str = "keyword";

/// Values longer than this are not indexed in the raw sub-field.
pub const RAW_IGNORE_ABOVE: u32 = 256;

/// Storage type of a single field in the destination index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldMapping {
    /// Analyzed full-text field with an exact `keyword` sub-field.
    Text,
    /// 64-bit integer.
    Long,
    /// Floating point number.
    Float,
    /// Date / timestamp.
    Date,
    /// Exact-match keyword without analysis.
    Keyword,
}

impl FieldMapping {
    /// The search-engine type name for this mapping.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldMapping::Text => "text",
            FieldMapping::Long => "long",
            FieldMapping::Float => "float",
            FieldMapping::Date => "date",
            FieldMapping::Keyword => "keyword",
        }
    }

    /// Render the field definition as it appears under `properties`.
    pub fn to_json(&self) -> Value {
        match self {
            FieldMapping::Text => json!({
                "type": "text",
                "fields": {
                    RAW_SUBFIELD: {
                        "type": "keyword",
                        "ignore_above": RAW_IGNORE_ABOVE
                    }
                }
            }),
            other => json!({ "type": other.type_name() }),
        }
    }
}

/// Schema for a destination index.
///
/// Fields set through [`IndexMapping::pin`] keep their type for the lifetime of the
/// mapping; later calls to [`IndexMapping::assign`] for those fields are ignored. This
/// makes the result independent of the order in which columns are inspected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexMapping {
    properties: BTreeMap<String, FieldMapping>,
    pinned: BTreeSet<String>,
}

impl IndexMapping {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field's type and protect it from later inference.
    pub fn pin(&mut self, field: impl Into<String>, mapping: FieldMapping) {
        let field = field.into();
        self.properties.insert(field.clone(), mapping);
        self.pinned.insert(field);
    }

    /// Set a field's type unless the field is pinned.
    ///
    /// Returns `true` when the mapping was written.
    pub fn assign(&mut self, field: impl Into<String>, mapping: FieldMapping) -> bool {
        let field = field.into();
        if self.pinned.contains(&field) {
            return false;
        }
        self.properties.insert(field, mapping);
        true
    }

    /// Look up the type of a field.
    pub fn get(&self, field: &str) -> Option<FieldMapping> {
        self.properties.get(field).copied()
    }

    /// Whether the field was pinned.
    pub fn is_pinned(&self, field: &str) -> bool {
        self.pinned.contains(field)
    }

    /// Number of mapped fields.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether no field is mapped.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Iterate over mapped fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, FieldMapping)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Render the body of a put-mapping request.
    pub fn to_json(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .properties
            .iter()
            .map(|(field, mapping)| (field.clone(), mapping.to_json()))
            .collect();

        json!({ "properties": properties })
    }
}
