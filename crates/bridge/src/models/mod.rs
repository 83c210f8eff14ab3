//! Storefront domain models.

pub mod category;
pub mod filter_field;
pub mod inventory;
pub mod product;

pub use category::Category;
pub use filter_field::{FilterField, FilterFieldType, FilterFieldValue};
pub use inventory::Inventory;
pub use product::{Money, Product, Variant};
