//! Catalog query types.
//!
//! Provides type definitions for the product query engine:
//! - ProductQuery / CategoryQuery: what the storefront asks for
//! - Filter / FacetRequest: structured selections (term, boolean, range)
//! - FacetResult: typed facet summaries returned with a result
//! - QueryResult: the paged result envelope

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::{Category, Product};

/// Product query as sent by the storefront.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_ids: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skus: Option<Vec<String>>,

    /// Category IDs; each matches the category and its descendants.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,

    /// Free-text search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facets: Option<Vec<FacetRequest>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_attributes: Option<SortAttributes>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

/// Structured filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Filter {
    /// Attribute key equals any of the terms.
    Term {
        identifier: String,
        #[serde(default, deserialize_with = "lenient_strings")]
        terms: Vec<String>,
    },
    /// Attribute equals the boolean parsed from the first term.
    Boolean {
        identifier: String,
        #[serde(default, deserialize_with = "lenient_strings")]
        terms: Vec<String>,
    },
    /// Numeric range; only honored for `price`.
    Range {
        identifier: String,
        #[serde(default, deserialize_with = "lenient_lower_bound")]
        min: Option<i64>,
        #[serde(default, deserialize_with = "lenient_upper_bound")]
        max: Option<i64>,
    },
}

impl Filter {
    pub fn identifier(&self) -> &str {
        match self {
            Filter::Term { identifier, .. }
            | Filter::Boolean { identifier, .. }
            | Filter::Range { identifier, .. } => identifier,
        }
    }
}

/// Facet selected by the shopper. `identifier` is a facet definition's attribute id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FacetRequest {
    Term {
        identifier: String,
        #[serde(default, deserialize_with = "lenient_strings")]
        terms: Vec<String>,
    },
    Boolean {
        identifier: String,
        #[serde(default, deserialize_with = "lenient_strings")]
        terms: Vec<String>,
    },
    Range {
        identifier: String,
        #[serde(default, deserialize_with = "lenient_lower_bound")]
        min: Option<i64>,
        #[serde(default, deserialize_with = "lenient_upper_bound")]
        max: Option<i64>,
    },
}

impl FacetRequest {
    pub fn identifier(&self) -> &str {
        match self {
            FacetRequest::Term { identifier, .. }
            | FacetRequest::Boolean { identifier, .. }
            | FacetRequest::Range { identifier, .. } => identifier,
        }
    }

    /// Selected terms (empty for ranges).
    pub fn terms(&self) -> &[String] {
        match self {
            FacetRequest::Term { terms, .. } | FacetRequest::Boolean { terms, .. } => terms,
            FacetRequest::Range { .. } => &[],
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => f.write_str("asc"),
            SortDirection::Desc => f.write_str("desc"),
        }
    }
}

impl SortDirection {
    /// Parse a direction, accepting any casing.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Some(SortDirection::Asc),
            "desc" | "descending" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// One sort specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortAttribute {
    pub field: String,
    pub direction: SortDirection,
}

/// Ordered sort specifications, serialized as a `field → direction` map.
///
/// Map order is sort priority, so it is preserved in both directions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortAttributes(pub Vec<SortAttribute>);

impl Serialize for SortAttributes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for attribute in &self.0 {
            map.serialize_entry(&attribute.field, &attribute.direction)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for SortAttributes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SortVisitor;

        impl<'de> Visitor<'de> for SortVisitor {
            type Value = SortAttributes;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field to sort direction")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut attributes = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((field, direction)) = access.next_entry::<String, String>()? {
                    let direction = SortDirection::parse(&direction).ok_or_else(|| {
                        serde::de::Error::custom(format!("invalid sort direction '{direction}'"))
                    })?;
                    attributes.push(SortAttribute { field, direction });
                }
                Ok(SortAttributes(attributes))
            }
        }

        deserializer.deserialize_map(SortVisitor)
    }
}

/// Output format of a category query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CategoryFormat {
    #[default]
    Flat,
    Tree,
}

/// Category query as sent by the storefront.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<CategoryFormat>,
}

/// One term of a term or boolean facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacetTerm {
    pub identifier: String,
    pub label: String,
    pub count: u64,
    pub key: String,
    pub selected: bool,
}

/// Summary of a term or boolean aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermFacet {
    pub identifier: String,
    pub label: String,
    pub key: String,
    pub selected: bool,
    pub terms: Vec<FacetTerm>,
}

/// Bounds selected for a range facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeValue {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

/// Summary of a range aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeFacet {
    pub identifier: String,
    pub label: String,
    pub key: String,
    pub selected: bool,
    /// Smallest value over all matching products.
    pub min: Option<i64>,
    /// Largest value over all matching products.
    pub max: Option<i64>,
    /// The requested bounds, when the facet is selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<RangeValue>,
}

/// Typed facet summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FacetResult {
    Term(TermFacet),
    Boolean(TermFacet),
    Range(RangeFacet),
}

impl FacetResult {
    pub fn identifier(&self) -> &str {
        match self {
            FacetResult::Term(f) | FacetResult::Boolean(f) => &f.identifier,
            FacetResult::Range(f) => &f.identifier,
        }
    }
}

/// An item of a result page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultItem {
    Product(Product),
    Category(Category),
}

/// The query a result answers, echoed back to the storefront.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryEcho {
    Product(ProductQuery),
    Category(CategoryQuery),
}

/// Paged result envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    /// Total matches (before paging).
    pub total: u64,
    /// Items on this page.
    pub count: u64,
    pub items: Vec<ResultItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facets: Option<Vec<FacetResult>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    pub query: QueryEcho,
}

impl QueryResult {
    /// Products on this page.
    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.items.iter().filter_map(|item| match item {
            ResultItem::Product(p) => Some(p),
            ResultItem::Category(_) => None,
        })
    }

    /// Categories on this page.
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.items.iter().filter_map(|item| match item {
            ResultItem::Category(c) => Some(c),
            ResultItem::Product(_) => None,
        })
    }
}

// -------------------------------------------------------------------------
// Lenient value conversion
// -------------------------------------------------------------------------

/// Convert a JSON scalar to a string (strings, numbers, booleans).
pub fn value_as_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Convert a JSON scalar to an integer (integers and numeric strings).
pub fn value_as_i64(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Side of a range a bound belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundSide {
    Lower,
    Upper,
}

/// Read a range bound from a number or numeric string.
///
/// Fractional bounds are rounded outward (lower down, upper up) so the range
/// never excludes the requested values.
pub fn value_as_bound(value: &serde_json::Value, side: BoundSide) -> Option<i64> {
    let fractional = match value {
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(whole) => return Some(whole),
            None => n.as_f64()?,
        },
        serde_json::Value::String(s) => {
            let s = s.trim();
            if let Ok(whole) = s.parse::<i64>() {
                return Some(whole);
            }
            s.parse::<f64>().ok()?
        }
        _ => return None,
    };
    if !fractional.is_finite() {
        return None;
    }

    let rounded = match side {
        BoundSide::Lower => fractional.floor(),
        BoundSide::Upper => fractional.ceil(),
    };
    tracing::debug!(bound = fractional, rounded, "rounded fractional range bound");
    Some(rounded as i64)
}

/// Collect the string values of a JSON list, or of an object's values
/// (query strings encode `terms[0]=a&terms[1]=b` as an object).
pub fn value_as_string_list(value: &serde_json::Value) -> Vec<String> {
    match value {
        serde_json::Value::Array(items) => items.iter().filter_map(value_as_string).collect(),
        serde_json::Value::Object(map) => map.values().filter_map(value_as_string).collect(),
        other => value_as_string(other).into_iter().collect(),
    }
}

fn lenient_strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value_as_string_list(&value))
}

fn lenient_lower_bound<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| value_as_bound(&v, BoundSide::Lower)))
}

fn lenient_upper_bound<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<i64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| value_as_bound(&v, BoundSide::Upper)))
}
