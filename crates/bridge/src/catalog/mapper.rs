//! Platform record mapping.
//!
//! Converts raw platform records into storefront models for one locale.

use crate::backend::types::{
    AttributeSchema, LocalizedString, RawCategory, RawInventoryEntry, RawPrice,
    RawProductProjection, RawVariant,
};
use crate::locale::Locale;
use crate::models::product::product_url;
use crate::models::{
    Category, FilterField, FilterFieldType, FilterFieldValue, Inventory, Money, Product, Variant,
};

/// Look up localized text: `lang-COUNTRY`, then `lang`, then any `lang-*` entry.
pub fn localized(values: &LocalizedString, locale: &Locale) -> Option<String> {
    values
        .get(&locale.language_tag())
        .or_else(|| values.get(&locale.language))
        .or_else(|| {
            let prefix = format!("{}-", locale.language);
            values
                .iter()
                .find(|(key, _)| key.starts_with(&prefix))
                .map(|(_, value)| value)
        })
        .cloned()
}

/// Map a product projection.
///
/// Products without a name in the requested language are not shown and map
/// to `None`.
pub fn projection_to_product(raw: &RawProductProjection, locale: &Locale) -> Option<Product> {
    let Some(name) = localized(&raw.name, locale).filter(|n| !n.is_empty()) else {
        tracing::debug!(product_id = %raw.id, "product without name skipped");
        return None;
    };

    let slug = localized(&raw.slug, locale);
    let variants: Vec<Variant> = std::iter::once(&raw.master_variant)
        .chain(raw.variants.iter())
        .map(|variant| variant_to_variant(variant, &raw.id))
        .collect();
    let mut product = Product {
        product_id: raw.id.clone(),
        changed_at: raw.last_modified_at.clone(),
        name,
        slug,
        description: raw
            .description
            .as_ref()
            .and_then(|d| localized(d, locale)),
        categories: raw
            .categories
            .iter()
            .map(|reference| match &reference.obj {
                Some(category) => category_to_category(category, locale),
                None => Category {
                    category_id: reference.id.clone(),
                    parent_id: None,
                    name: None,
                    slug: None,
                    depth: 0,
                    path: format!("/{}", reference.id),
                    order_hint: String::new(),
                    url: None,
                    sub_categories: None,
                },
            })
            .collect(),
        variants,
        url: None,
    };
    product.url = product_url(product.slug.as_deref(), product.primary_sku());

    Some(product)
}

fn variant_to_variant(raw: &RawVariant, product_id: &str) -> Variant {
    let price = raw
        .scoped_price
        .as_ref()
        .or(raw.price.as_ref())
        .or_else(|| raw.prices.first());

    let discounted_price = price
        .and_then(|p| p.discounted.as_ref())
        .map(|d| money(&d.value));

    Variant {
        id: raw.id.to_string(),
        sku: raw.sku.clone(),
        group_id: Some(product_id.to_string()),
        price: price.map(|p: &RawPrice| money(&p.value)),
        is_discounted: discounted_price.is_some() || raw.scoped_price_discounted == Some(true),
        discounted_price,
        attributes: raw
            .attributes
            .iter()
            .map(|a| (a.name.clone(), a.value.clone()))
            .collect(),
        images: raw.images.iter().map(|i| i.url.clone()).collect(),
        is_on_stock: raw.availability.as_ref().and_then(|a| a.is_on_stock),
    }
}

fn money(raw: &crate::backend::types::RawMoney) -> Money {
    Money {
        cent_amount: raw.cent_amount,
        currency_code: raw.currency_code.clone(),
        fraction_digits: raw.fraction_digits,
    }
}

/// Map an inventory entry.
pub fn inventory_entry_to_inventory(raw: &RawInventoryEntry) -> Inventory {
    Inventory {
        inventory_id: raw.id.clone(),
        sku: raw.sku.clone(),
        available_quantity: raw.available_quantity,
        quantity_on_stock: raw.quantity_on_stock,
        restockable_in_days: raw.restockable_in_days,
        expected_delivery: raw.expected_delivery.clone(),
        supply_channel_id: raw.supply_channel.as_ref().map(|c| c.id.clone()),
    }
}

/// Map a category record.
pub fn category_to_category(raw: &RawCategory, locale: &Locale) -> Category {
    let slug = localized(&raw.slug, locale);
    let mut path = String::new();
    for ancestor in &raw.ancestors {
        path.push('/');
        path.push_str(&ancestor.id);
    }
    path.push('/');
    path.push_str(&raw.id);

    Category {
        category_id: raw.id.clone(),
        parent_id: raw.parent.as_ref().map(|p| p.id.clone()),
        name: localized(&raw.name, locale),
        url: slug.as_ref().map(|s| format!("/{s}")),
        slug,
        depth: raw.ancestors.len(),
        path,
        order_hint: raw.order_hint.clone(),
        sub_categories: None,
    }
}

/// Map attribute schemas to filter fields.
///
/// Only searchable attributes with a filterable type are returned; the first
/// schema of each name wins.
pub fn attribute_schemas_to_filter_fields(
    schemas: &[AttributeSchema],
    locale: &Locale,
) -> Vec<FilterField> {
    let mut seen = std::collections::HashSet::new();

    schemas
        .iter()
        .filter(|schema| schema.is_searchable)
        .filter(|schema| seen.insert(schema.name.clone()))
        .filter_map(|schema| {
            let mut attribute_type = &schema.attribute_type;
            if attribute_type.name == "set" {
                attribute_type = attribute_type.element_type.as_deref()?;
            }

            let field_type = match attribute_type.name.as_str() {
                "boolean" => FilterFieldType::Boolean,
                "enum" | "lenum" => FilterFieldType::Enum,
                "text" | "ltext" => FilterFieldType::Text,
                "number" => FilterFieldType::Number,
                "money" => FilterFieldType::Money,
                _ => return None,
            };

            let values = (field_type == FilterFieldType::Enum).then(|| {
                attribute_type
                    .values
                    .iter()
                    .map(|value| FilterFieldValue {
                        value: value.key.clone(),
                        name: enum_label(&value.label, locale),
                    })
                    .collect()
            });

            let field = format!("{}{}", super::facet::ATTRIBUTE_PREFIX, schema.name);
            Some(FilterField {
                label: localized(&schema.label, locale).unwrap_or_else(|| schema.name.clone()),
                field,
                field_type,
                values,
            })
        })
        .collect()
}

/// Category filter field listing the given categories as values.
pub fn categories_to_filter_field(categories: &[Category]) -> FilterField {
    FilterField {
        field: "categoryId".to_string(),
        field_type: FilterFieldType::Enum,
        label: "Category ID".to_string(),
        values: Some(
            categories
                .iter()
                .map(|c| FilterFieldValue {
                    value: c.category_id.clone(),
                    name: c.name.clone(),
                })
                .collect(),
        ),
    }
}

/// Enum labels are plain strings for `enum` and localized objects for `lenum`.
fn enum_label(label: &serde_json::Value, locale: &Locale) -> Option<String> {
    match label {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(_) => {
            let values: LocalizedString = serde_json::from_value(label.clone()).ok()?;
            localized(&values, locale)
        }
        _ => None,
    }
}
