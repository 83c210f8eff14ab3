//! Searchable attribute descriptors.

use serde::{Deserialize, Serialize};

/// Kind of value a filter field accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterFieldType {
    Boolean,
    Enum,
    Text,
    Number,
    Money,
}

/// One selectable value of an enum field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterFieldValue {
    pub value: String,
    pub name: Option<String>,
}

/// An attribute the storefront may filter on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterField {
    pub field: String,
    #[serde(rename = "type")]
    pub field_type: FilterFieldType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<FilterFieldValue>>,
}
