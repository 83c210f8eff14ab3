//! Commerce platform wire types.
//!
//! Raw records as returned by the platform REST API. These are mapped into
//! the storefront domain model by `catalog::mapper`.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Localized text keyed by language tag ("en", "en-US", ...).
pub type LocalizedString = BTreeMap<String, String>;

/// Reference to another platform resource, optionally expanded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    pub id: String,
    #[serde(default)]
    pub type_id: Option<String>,
    /// Expanded category, present when the reference was expanded.
    #[serde(default)]
    pub obj: Option<Box<RawCategory>>,
}

impl Reference {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            type_id: None,
            obj: None,
        }
    }
}

/// Monetary amount in the currency's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMoney {
    pub cent_amount: i64,
    pub currency_code: String,
    #[serde(default = "default_fraction_digits")]
    pub fraction_digits: u32,
}

fn default_fraction_digits() -> u32 {
    2
}

/// Discount applied to a price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDiscountedPrice {
    pub value: RawMoney,
}

/// Price of a variant (also used for the scoped price).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPrice {
    #[serde(default)]
    pub id: Option<String>,
    pub value: RawMoney,
    #[serde(default)]
    pub discounted: Option<RawDiscountedPrice>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAttribute {
    pub name: String,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawImage {
    pub url: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAvailability {
    #[serde(default)]
    pub is_on_stock: Option<bool>,
    #[serde(default)]
    pub available_quantity: Option<i64>,
}

/// A product variant inside a projection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVariant {
    pub id: i64,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub prices: Vec<RawPrice>,
    /// Price selected by the platform for the requested currency/country.
    #[serde(default)]
    pub price: Option<RawPrice>,
    #[serde(default)]
    pub scoped_price: Option<RawPrice>,
    #[serde(default)]
    pub scoped_price_discounted: Option<bool>,
    #[serde(default)]
    pub attributes: Vec<RawAttribute>,
    #[serde(default)]
    pub images: Vec<RawImage>,
    #[serde(default)]
    pub availability: Option<RawAvailability>,
}

/// A product projection returned by product search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawProductProjection {
    pub id: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub name: LocalizedString,
    #[serde(default)]
    pub slug: LocalizedString,
    #[serde(default)]
    pub description: Option<LocalizedString>,
    #[serde(default)]
    pub categories: Vec<Reference>,
    #[serde(default)]
    pub master_variant: RawVariant,
    #[serde(default)]
    pub variants: Vec<RawVariant>,
    #[serde(default)]
    pub last_modified_at: Option<String>,
}

/// Stock record of one SKU, optionally scoped to a supply channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInventoryEntry {
    pub id: String,
    pub sku: String,
    #[serde(default)]
    pub quantity_on_stock: i64,
    #[serde(default)]
    pub available_quantity: i64,
    #[serde(default)]
    pub restockable_in_days: Option<u32>,
    /// Expected delivery timestamp (RFC 3339).
    #[serde(default)]
    pub expected_delivery: Option<String>,
    #[serde(default)]
    pub supply_channel: Option<Reference>,
}

/// A category record. Hierarchy is expressed through `parent` and `ancestors`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCategory {
    pub id: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub name: LocalizedString,
    #[serde(default)]
    pub slug: LocalizedString,
    #[serde(default)]
    pub ancestors: Vec<Reference>,
    #[serde(default)]
    pub parent: Option<Reference>,
    #[serde(default)]
    pub order_hint: String,
}

/// Type descriptor of a catalog attribute (`text`, `lenum`, `set`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAttributeType {
    pub name: String,
    /// Allowed values for enum types.
    #[serde(default)]
    pub values: Vec<RawEnumValue>,
    /// Element type for `set` types.
    #[serde(default)]
    pub element_type: Option<Box<RawAttributeType>>,
}

impl RawAttributeType {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            element_type: None,
        }
    }
}

/// Enum value; `label` is a plain string for `enum` and localized for `lenum`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEnumValue {
    pub key: String,
    #[serde(default)]
    pub label: serde_json::Value,
}

/// Schema of one catalog attribute, flattened out of the product types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSchema {
    pub name: String,
    #[serde(default)]
    pub label: LocalizedString,
    #[serde(rename = "type")]
    pub attribute_type: RawAttributeType,
    #[serde(default)]
    pub is_searchable: bool,
}

/// Product type as returned by the platform; only used to flatten schemas.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProductType {
    pub id: String,
    #[serde(default)]
    pub attributes: Vec<AttributeSchema>,
}

/// Standard paged query response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PagedResponse<T> {
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Product projection search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductSearchResponse {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub results: Vec<RawProductProjection>,
    /// Aggregation results keyed by facet alias.
    #[serde(default)]
    pub facets: HashMap<String, RawFacetResult>,
}

/// Raw aggregation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RawFacetResult {
    Terms {
        #[serde(default, rename = "dataType")]
        data_type: Option<String>,
        #[serde(default)]
        missing: u64,
        #[serde(default)]
        total: u64,
        #[serde(default)]
        other: u64,
        #[serde(default)]
        terms: Vec<RawFacetTerm>,
    },
    Range {
        #[serde(default)]
        ranges: Vec<RawFacetRange>,
    },
    Filter {
        #[serde(default)]
        count: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFacetTerm {
    pub term: serde_json::Value,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub product_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawFacetRange {
    #[serde(default)]
    pub from: Option<f64>,
    #[serde(default)]
    pub to: Option<f64>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub product_count: Option<u64>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub mean: Option<f64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn search_response_deserializes_facets() {
        let json = serde_json::json!({
            "count": 1,
            "total": 1,
            "offset": 0,
            "results": [{
                "id": "p1",
                "name": {"en": "Shoe"},
                "slug": {"en": "shoe"},
                "masterVariant": {"id": 1, "sku": "SKU-1"}
            }],
            "facets": {
                "variants.attributes.color": {
                    "type": "terms",
                    "dataType": "text",
                    "missing": 0,
                    "total": 1,
                    "other": 0,
                    "terms": [{"term": "red", "count": 1, "productCount": 1}]
                },
                "variants.price": {
                    "type": "range",
                    "ranges": [{"from": 0.0, "count": 1, "min": 1000.0, "max": 1000.0}]
                }
            }
        });

        let response: ProductSearchResponse = serde_json::from_value(json).unwrap();
        assert_eq!(response.results[0].master_variant.sku.as_deref(), Some("SKU-1"));
        assert!(matches!(
            response.facets.get("variants.attributes.color"),
            Some(RawFacetResult::Terms { terms, .. }) if terms.len() == 1
        ));
        assert!(matches!(
            response.facets.get("variants.price"),
            Some(RawFacetResult::Range { ranges }) if ranges[0].max == Some(1000.0)
        ));
    }

    #[test]
    fn attribute_schema_reads_type_field() {
        let json = serde_json::json!({
            "name": "color",
            "label": {"en": "Color"},
            "type": {"name": "lenum", "values": [{"key": "red", "label": {"en": "Red"}}]},
            "isSearchable": true
        });

        let schema: AttributeSchema = serde_json::from_value(json).unwrap();
        assert_eq!(schema.attribute_type.name, "lenum");
        assert_eq!(schema.attribute_type.values[0].key, "red");
        assert!(schema.is_searchable);
    }

    #[test]
    fn category_defaults_missing_fields() {
        let category: RawCategory =
            serde_json::from_value(serde_json::json!({"id": "c1"})).unwrap();
        assert!(category.parent.is_none());
        assert_eq!(category.order_hint, "");
    }
}
