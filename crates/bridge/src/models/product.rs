//! Product domain model.
//!
//! Products are what the storefront renders; they are mapped from platform
//! product projections for one locale.

use serde::{Deserialize, Serialize};

use super::category::Category;

/// Money amount in the currency's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    pub cent_amount: i64,
    pub currency_code: String,
    pub fraction_digits: u32,
}

/// A purchasable variant of a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    /// Variant ID (unique within the product).
    pub id: String,

    pub sku: Option<String>,

    /// Owning product ID.
    pub group_id: Option<String>,

    /// Price for the requested currency/country.
    pub price: Option<Money>,

    /// Discounted price, when a discount applies.
    pub discounted_price: Option<Money>,

    pub is_discounted: bool,

    /// Attribute values keyed by attribute name.
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,

    /// Image URLs.
    #[serde(default)]
    pub images: Vec<String>,

    pub is_on_stock: Option<bool>,
}

/// A product with its variants, localized for one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub product_id: String,

    /// Last modification timestamp (RFC 3339).
    pub changed_at: Option<String>,

    pub name: String,

    pub slug: Option<String>,

    pub description: Option<String>,

    #[serde(default)]
    pub categories: Vec<Category>,

    /// Master variant first, then the remaining variants.
    #[serde(default)]
    pub variants: Vec<Variant>,

    /// Storefront URL (`/<slug>/p/<sku>`).
    #[serde(rename = "_url")]
    pub url: Option<String>,
}

impl Product {
    /// SKU of the first variant, used in product URLs.
    pub fn primary_sku(&self) -> Option<&str> {
        self.variants.first().and_then(|v| v.sku.as_deref())
    }
}

/// Build the storefront URL of a product.
pub fn product_url(slug: Option<&str>, sku: Option<&str>) -> Option<String> {
    let slug = slug?;
    let sku = sku?;
    Some(format!("/{slug}/p/{sku}"))
}
