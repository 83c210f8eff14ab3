//! Commerce platform backend clients.
//!
//! This module provides:
//! - ProductSearchClient / CategoryClient / CatalogSchemaClient / InventoryClient:
//!   async client traits
//! - HttpCommerceClient: REST implementation of all four
//! - CachedSchemaClient: TTL cache in front of a schema client
//! - Wire types for the platform's responses

mod cache;
mod http;
pub mod types;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BackendResult;

pub use cache::CachedSchemaClient;
pub use http::{ClientConfig, HttpCommerceClient};
pub use types::{
    AttributeSchema, PagedResponse, ProductSearchResponse, RawCategory, RawFacetResult,
    RawInventoryEntry, RawProductProjection,
};

/// Product projection search.
#[async_trait]
pub trait ProductSearchClient: Send + Sync {
    /// Run a product projection search.
    async fn search(&self, args: SearchArgs) -> BackendResult<ProductSearchResponse>;
}

/// Category listing.
#[async_trait]
pub trait CategoryClient: Send + Sync {
    /// List categories matching the given predicates.
    async fn list(&self, args: CategoryListArgs) -> BackendResult<PagedResponse<RawCategory>>;
}

/// Catalog attribute schemas.
#[async_trait]
pub trait CatalogSchemaClient: Send + Sync {
    /// List the attribute schemas of every product type.
    async fn list_attribute_schemas(&self) -> BackendResult<Vec<AttributeSchema>>;
}

/// Inventory entries.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// List inventory entries matching the given predicates.
    async fn list_inventory(
        &self,
        args: InventoryListArgs,
    ) -> BackendResult<PagedResponse<RawInventoryEntry>>;
}

/// Free-text search in one language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSearch {
    pub language: String,
    pub text: String,
}

/// Arguments of a product projection search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchArgs {
    pub sort: Vec<String>,
    pub limit: u32,
    pub offset: Option<u64>,
    pub price_currency: String,
    pub price_country: String,
    /// Aggregation requests.
    pub facet: Option<Vec<String>>,
    /// Filters applied to results only (facet counts unaffected).
    pub filter: Option<Vec<String>>,
    /// Filters applied to facet calculation.
    pub filter_facets: Option<Vec<String>>,
    /// Filters applied to both results and facets.
    pub filter_query: Option<Vec<String>>,
    pub text: Option<TextSearch>,
    pub fuzzy: bool,
}

impl SearchArgs {
    /// Encode as query string pairs. Multi-valued arguments repeat their key.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();

        for sort in &self.sort {
            pairs.push(("sort".to_string(), sort.clone()));
        }
        pairs.push(("limit".to_string(), self.limit.to_string()));
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }
        pairs.push(("priceCurrency".to_string(), self.price_currency.clone()));
        pairs.push(("priceCountry".to_string(), self.price_country.clone()));

        let multi = [
            ("facet", &self.facet),
            ("filter", &self.filter),
            ("filter.facets", &self.filter_facets),
            ("filter.query", &self.filter_query),
        ];
        for (key, values) in multi {
            for value in values.iter().flatten() {
                pairs.push((key.to_string(), value.clone()));
            }
        }

        if let Some(text) = &self.text {
            pairs.push((format!("text.{}", text.language), text.text.clone()));
        }
        pairs.push(("fuzzy".to_string(), self.fuzzy.to_string()));

        pairs
    }
}

/// Arguments of a category listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryListArgs {
    pub limit: u32,
    pub offset: Option<u64>,
    pub where_clauses: Option<Vec<String>>,
}

impl CategoryListArgs {
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("limit".to_string(), self.limit.to_string())];
        if let Some(offset) = self.offset {
            pairs.push(("offset".to_string(), offset.to_string()));
        }
        for clause in self.where_clauses.iter().flatten() {
            pairs.push(("where".to_string(), clause.clone()));
        }
        pairs
    }
}

/// Arguments of an inventory listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryListArgs {
    pub limit: u32,
    pub where_clauses: Vec<String>,
}

impl InventoryListArgs {
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("limit".to_string(), self.limit.to_string())];
        for clause in &self.where_clauses {
            pairs.push(("where".to_string(), clause.clone()));
        }
        pairs
    }
}

/// The backend clients a request needs.
#[derive(Clone)]
pub struct Backends {
    pub search: Arc<dyn ProductSearchClient>,
    pub categories: Arc<dyn CategoryClient>,
    pub schemas: Arc<dyn CatalogSchemaClient>,
    pub inventory: Arc<dyn InventoryClient>,
}

impl Backends {
    /// Use one client for every role.
    pub fn from_client<C>(client: Arc<C>) -> Self
    where
        C: ProductSearchClient + CategoryClient + CatalogSchemaClient + InventoryClient + 'static,
    {
        Self {
            search: client.clone(),
            categories: client.clone(),
            schemas: client.clone(),
            inventory: client,
        }
    }

    /// Replace the schema client (e.g. with a cached one).
    pub fn with_schemas(mut self, schemas: Arc<dyn CatalogSchemaClient>) -> Self {
        self.schemas = schemas;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> SearchArgs {
        SearchArgs {
            sort: vec!["score desc".to_string(), "id desc".to_string()],
            limit: 24,
            offset: None,
            price_currency: "EUR".to_string(),
            price_country: "DE".to_string(),
            facet: None,
            filter: None,
            filter_facets: None,
            filter_query: None,
            text: None,
            fuzzy: true,
        }
    }

    #[test]
    fn search_args_repeat_multi_valued_keys() {
        let args = SearchArgs {
            filter_query: Some(vec!["id:\"a\"".to_string(), "variants.sku:\"b\"".to_string()]),
            text: Some(TextSearch {
                language: "de".to_string(),
                text: "schuh".to_string(),
            }),
            offset: Some(48),
            ..base_args()
        };

        let pairs = args.to_query_pairs();
        let filters: Vec<_> = pairs.iter().filter(|(k, _)| k == "filter.query").collect();
        assert_eq!(filters.len(), 2);
        assert!(pairs.contains(&("text.de".to_string(), "schuh".to_string())));
        assert!(pairs.contains(&("offset".to_string(), "48".to_string())));
        assert_eq!(pairs[0], ("sort".to_string(), "score desc".to_string()));
        assert_eq!(pairs[1], ("sort".to_string(), "id desc".to_string()));
    }

    #[test]
    fn search_args_omit_absent_arguments() {
        let pairs = base_args().to_query_pairs();
        assert!(!pairs.iter().any(|(k, _)| k == "offset" || k == "facet" || k == "filter"));
        assert!(pairs.contains(&("fuzzy".to_string(), "true".to_string())));
    }

    #[test]
    fn category_args_repeat_where() {
        let args = CategoryListArgs {
            limit: 24,
            offset: Some(24),
            where_clauses: Some(vec!["a".to_string(), "b".to_string()]),
        };
        let pairs = args.to_query_pairs();
        assert_eq!(pairs.len(), 4);
    }

    #[test]
    fn inventory_args_carry_where() {
        let args = InventoryListArgs {
            limit: 1,
            where_clauses: vec![r#"sku="SKU-1""#.to_string()],
        };
        assert_eq!(
            args.to_query_pairs(),
            vec![
                ("limit".to_string(), "1".to_string()),
                ("where".to_string(), r#"sku="SKU-1""#.to_string()),
            ]
        );
    }
}
