//! Product queries from request parameters.
//!
//! Query-string parameters arrive as a loose JSON object: numbers may be
//! strings and lists may be indexed objects (`terms[0]=a`). Anything that
//! cannot be read is skipped.

use serde_json::{Map, Value};

use super::types::{
    BoundSide, FacetRequest, Filter, ProductQuery, SortAttribute, SortAttributes, SortDirection,
    value_as_bound, value_as_i64, value_as_string, value_as_string_list,
};

/// Builds [`ProductQuery`] values from action parameters.
pub struct ProductQueryFactory;

impl ProductQueryFactory {
    pub fn from_params(params: &Map<String, Value>) -> ProductQuery {
        let mut categories = list(params, "categories");
        if let Some(category) = params.get("category").and_then(value_as_string) {
            categories.get_or_insert_with(Vec::new).push(category);
        }

        ProductQuery {
            product_ids: list(params, "productIds"),
            skus: list(params, "skus"),
            categories,
            query: params
                .get("query")
                .and_then(value_as_string)
                .filter(|q| !q.trim().is_empty()),
            filters: params.get("filters").map(filters),
            facets: params.get("facets").map(facets),
            sort_attributes: params.get("sortAttributes").and_then(sort_attributes),
            limit: params
                .get("limit")
                .and_then(value_as_i64)
                .and_then(|l| u32::try_from(l).ok())
                .filter(|l| *l > 0),
            cursor: params.get("cursor").and_then(value_as_string),
        }
    }
}

fn list(params: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    params.get(key).map(value_as_string_list)
}

fn entries(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => map.values().collect(),
        _ => Vec::new(),
    }
}

fn filters(value: &Value) -> Vec<Filter> {
    entries(value)
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry.clone()) {
            Ok(filter) => Some(filter),
            Err(error) => {
                tracing::warn!(%error, "ignoring malformed filter");
                None
            }
        })
        .collect()
}

/// Facets are either a list of tagged requests or an object keyed by
/// identifier (`facets[<id>][terms][0]=red`, `facets[<id>][min]=100`,
/// `facets[<id>][boolean]=true`).
fn facets(value: &Value) -> Vec<FacetRequest> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|entry| match serde_json::from_value(entry.clone()) {
                Ok(facet) => Some(facet),
                Err(error) => {
                    tracing::warn!(%error, "ignoring malformed facet");
                    None
                }
            })
            .collect(),
        Value::Object(map) => map
            .iter()
            .filter_map(|(identifier, selection)| keyed_facet(identifier, selection))
            .collect(),
        _ => Vec::new(),
    }
}

fn keyed_facet(identifier: &str, selection: &Value) -> Option<FacetRequest> {
    let identifier = identifier.to_string();
    let selection = selection.as_object()?;

    if let Some(terms) = selection.get("terms") {
        return Some(FacetRequest::Term {
            identifier,
            terms: value_as_string_list(terms),
        });
    }
    if let Some(boolean) = selection.get("boolean") {
        return Some(FacetRequest::Boolean {
            identifier,
            terms: value_as_string_list(boolean),
        });
    }

    let min = selection
        .get("min")
        .and_then(|v| value_as_bound(v, BoundSide::Lower));
    let max = selection
        .get("max")
        .and_then(|v| value_as_bound(v, BoundSide::Upper));
    if min.is_some() || max.is_some() {
        return Some(FacetRequest::Range {
            identifier,
            min,
            max,
        });
    }

    tracing::warn!(%identifier, "ignoring facet without a selection");
    None
}

fn sort_attributes(value: &Value) -> Option<SortAttributes> {
    let map = value.as_object()?;
    let attributes: Vec<SortAttribute> = map
        .iter()
        .filter_map(|(field, direction)| {
            let parsed = direction.as_str().and_then(SortDirection::parse);
            if parsed.is_none() {
                tracing::warn!(%field, "ignoring sort attribute with invalid direction");
            }
            Some(SortAttribute {
                field: field.clone(),
                direction: parsed?,
            })
        })
        .collect();
    (!attributes.is_empty()).then_some(SortAttributes(attributes))
}
