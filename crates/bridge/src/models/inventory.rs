//! Inventory domain model.

use serde::{Deserialize, Serialize};

/// Stock level of one SKU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inventory {
    pub inventory_id: String,
    pub sku: String,
    pub available_quantity: i64,
    pub quantity_on_stock: i64,
    pub restockable_in_days: Option<u32>,
    /// Expected delivery timestamp (RFC 3339).
    pub expected_delivery: Option<String>,
    /// Supply channel the stock is held for, if any.
    pub supply_channel_id: Option<String>,
}

impl Inventory {
    pub fn is_on_stock(&self) -> bool {
        self.available_quantity > 0
    }
}
