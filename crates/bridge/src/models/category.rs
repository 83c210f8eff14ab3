//! Category domain model.
//!
//! A category is a flat record with a `parent_id` reference. When categories
//! are requested as a tree, `sub_categories` holds the children built by
//! `catalog::category_tree`.

use serde::{Deserialize, Serialize};

/// A category localized for one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_id: String,

    /// Parent category ID (NULL for root categories).
    pub parent_id: Option<String>,

    pub name: Option<String>,

    pub slug: Option<String>,

    /// Number of ancestors.
    pub depth: usize,

    /// Ancestor IDs joined with `/`, ending with this category's ID.
    pub path: String,

    /// Sibling sort weight (decimal string, higher sorts first in trees).
    #[serde(default)]
    pub order_hint: String,

    /// Storefront URL (`/<slug>`).
    #[serde(rename = "_url")]
    pub url: Option<String>,

    /// Children, only present in tree results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_categories: Option<Vec<Category>>,
}

impl Category {
    /// Numeric value of the order hint; unparsable hints count as zero.
    pub fn order_weight(&self) -> f64 {
        self.order_hint
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|w| w.is_finite())
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(order_hint: &str) -> Category {
        Category {
            category_id: "c".to_string(),
            parent_id: None,
            name: None,
            slug: None,
            depth: 0,
            path: "/c".to_string(),
            order_hint: order_hint.to_string(),
            url: None,
            sub_categories: None,
        }
    }

    #[test]
    fn order_weight_parses_decimal_hints() {
        assert_eq!(category("0.25").order_weight(), 0.25);
        assert_eq!(category("5").order_weight(), 5.0);
        assert_eq!(category("").order_weight(), 0.0);
        assert_eq!(category("abc").order_weight(), 0.0);
        assert_eq!(category("NaN").order_weight(), 0.0);
    }

    #[test]
    fn flat_category_omits_sub_categories() {
        let json = serde_json::to_value(category("1")).unwrap_or_default();
        assert!(json.get("subCategories").is_none());
        assert_eq!(json["categoryId"], "c");
    }
}
