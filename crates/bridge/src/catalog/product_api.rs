//! Query executor.
//!
//! `ProductApi` runs storefront queries for one locale: it resolves facet
//! definitions, compiles filters, calls the search backend and shapes the
//! paged result.

use super::category_tree;
use super::cursor;
use super::facet;
use super::filter::{self, quote};
use super::mapper;
use super::types::{
    CategoryFormat, CategoryQuery, ProductQuery, QueryEcho, QueryResult, ResultItem,
};
use crate::backend::{
    Backends, CategoryListArgs, InventoryListArgs, PagedResponse, RawCategory, SearchArgs,
    TextSearch,
};
use crate::error::{BridgeError, BridgeResult};
use crate::locale::Locale;
use crate::models::{Category, FilterField, Inventory, Product};

/// Sort used when the query has none.
pub const DEFAULT_SORT: [&str; 2] = ["score desc", "id desc"];

/// Categories listed as values of the `categoryId` filter field.
pub const CATEGORY_FIELD_LIMIT: u32 = 250;

/// Page size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySettings {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            default_limit: 24,
            max_limit: 500,
        }
    }
}

impl QuerySettings {
    /// Effective page size for a requested limit.
    pub fn page_size(&self, requested: Option<u32>) -> u32 {
        requested
            .filter(|l| *l > 0)
            .unwrap_or(self.default_limit)
            .min(self.max_limit)
    }
}

/// Product and category queries for one locale.
pub struct ProductApi {
    backends: Backends,
    locale: Locale,
    settings: QuerySettings,
}

impl ProductApi {
    pub fn new(backends: Backends, locale: Locale, settings: QuerySettings) -> Self {
        Self {
            backends,
            locale,
            settings,
        }
    }

    /// Run a product query.
    pub async fn query(&self, query: ProductQuery) -> BridgeResult<QueryResult> {
        self.run_query(query, "query").await
    }

    /// First product matching the query, if any.
    pub async fn get_product(&self, query: ProductQuery) -> BridgeResult<Option<Product>> {
        let result = self.run_query(query, "getProduct").await?;
        Ok(result.products().next().cloned())
    }

    /// Run a product query scoped to the category with the given slug.
    ///
    /// When no category matches, the slug itself is used as the category id.
    pub async fn query_by_category_slug(
        &self,
        slug: &str,
        mut query: ProductQuery,
    ) -> BridgeResult<QueryResult> {
        let lookup = CategoryQuery {
            slug: Some(slug.to_string()),
            limit: Some(1),
            ..Default::default()
        };
        let categories = self.query_categories(lookup, true).await?;

        let category_id = match categories.categories().next() {
            Some(category) => category.category_id.clone(),
            None => {
                tracing::debug!(%slug, "no category for slug, using it as id");
                slug.to_string()
            }
        };

        query.categories = Some(vec![category_id]);
        self.query(query).await
    }

    async fn run_query(
        &self,
        query: ProductQuery,
        operation: &'static str,
    ) -> BridgeResult<QueryResult> {
        let schemas = self
            .backends
            .schemas
            .list_attribute_schemas()
            .await
            .map_err(BridgeError::backend(operation))?;
        let definitions = facet::facet_definitions(&schemas, &self.locale);

        let requested = query.facets.as_deref().unwrap_or_default();
        let filter_query = filter::compile(&query).to_query_args();
        let facet_args = facet::definitions_to_query_args(&definitions, requested, &self.locale);
        let filter_facets =
            facet::requested_to_filter_facets(requested, &definitions, &self.locale);

        let sort: Vec<String> = match &query.sort_attributes {
            Some(sorts) if !sorts.0.is_empty() => sorts
                .0
                .iter()
                .map(|s| format!("{} {}", s.field, s.direction))
                .collect(),
            _ => DEFAULT_SORT.iter().map(ToString::to_string).collect(),
        };

        let text = query
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| TextSearch {
                language: self.locale.language.clone(),
                text: q.to_string(),
            });

        let args = SearchArgs {
            sort,
            limit: self.settings.page_size(query.limit),
            offset: cursor::decode(query.cursor.as_deref()),
            price_currency: self.locale.currency.clone(),
            price_country: self.locale.country.clone(),
            facet: non_empty(facet_args),
            filter: non_empty(filter_facets.clone()),
            filter_facets: non_empty(filter_facets),
            filter_query: non_empty(filter_query),
            text,
            fuzzy: true,
        };

        tracing::debug!(
            operation,
            limit = args.limit,
            offset = ?args.offset,
            filters = ?args.filter_query,
            "searching products"
        );

        let response = self
            .backends
            .search
            .search(args)
            .await
            .map_err(BridgeError::backend(operation))?;

        let items: Vec<ResultItem> = response
            .results
            .iter()
            .filter_map(|raw| mapper::projection_to_product(raw, &self.locale))
            .map(ResultItem::Product)
            .collect();
        let facets =
            facet::results_to_facets(&response.facets, &definitions, &query, &self.locale);

        Ok(QueryResult {
            total: response.total,
            count: items.len() as u64,
            items,
            facets: Some(facets),
            previous_cursor: cursor::encode_previous(response.offset, response.count),
            next_cursor: cursor::encode_next(response.offset, response.count, response.total),
            query: QueryEcho::Product(query),
        })
    }

    /// List categories, flat or as a tree.
    ///
    /// With `consider_id`, a slug also matches a category id; if the backend
    /// rejects that predicate the query is retried once with the slug alone.
    pub async fn query_categories(
        &self,
        query: CategoryQuery,
        consider_id: bool,
    ) -> BridgeResult<QueryResult> {
        let response = match self.list_categories(&query, consider_id).await {
            Ok(response) => response,
            Err(error) if consider_id && query.slug.is_some() => {
                tracing::warn!(%error, "category lookup by id failed, retrying by slug only");
                self.list_categories(&query, false).await?
            }
            Err(error) => return Err(error),
        };

        let categories: Vec<Category> = response
            .results
            .iter()
            .map(|raw| mapper::category_to_category(raw, &self.locale))
            .collect();
        let categories = match query.format.unwrap_or_default() {
            CategoryFormat::Tree => category_tree::build(categories),
            CategoryFormat::Flat => categories,
        };
        let items: Vec<ResultItem> = categories.into_iter().map(ResultItem::Category).collect();

        Ok(QueryResult {
            total: response.total,
            count: items.len() as u64,
            items,
            facets: None,
            previous_cursor: cursor::encode_previous(response.offset, response.count),
            next_cursor: cursor::encode_next(response.offset, response.count, response.total),
            query: QueryEcho::Category(query),
        })
    }

    async fn list_categories(
        &self,
        query: &CategoryQuery,
        consider_id: bool,
    ) -> BridgeResult<PagedResponse<RawCategory>> {
        let mut where_clauses = Vec::new();
        if let Some(slug) = &query.slug {
            let by_slug = format!("slug({}={})", self.locale.language, quote(slug));
            where_clauses.push(if consider_id {
                format!("{by_slug} or id={}", quote(slug))
            } else {
                by_slug
            });
        }
        if let Some(parent_id) = &query.parent_id {
            where_clauses.push(format!("parent(id={})", quote(parent_id)));
        }

        let args = CategoryListArgs {
            limit: self.settings.page_size(query.limit),
            offset: cursor::decode(query.cursor.as_deref()),
            where_clauses: non_empty(where_clauses),
        };
        tracing::debug!(where_clauses = ?args.where_clauses, "listing categories");

        self.backends
            .categories
            .list(args)
            .await
            .map_err(BridgeError::backend("queryCategories"))
    }

    /// Stock level of a SKU; `None` when the platform has no entry for it.
    pub async fn get_inventory(&self, sku: &str) -> BridgeResult<Option<Inventory>> {
        let args = InventoryListArgs {
            limit: 1,
            where_clauses: vec![format!("sku={}", quote(sku))],
        };
        tracing::debug!(%sku, "looking up inventory");

        let response = self
            .backends
            .inventory
            .list_inventory(args)
            .await
            .map_err(BridgeError::backend("getInventory"))?;

        Ok(response
            .results
            .first()
            .map(mapper::inventory_entry_to_inventory))
    }

    /// Filterable attributes plus a `categoryId` field listing categories.
    pub async fn searchable_attributes(&self) -> BridgeResult<Vec<FilterField>> {
        let schemas = self
            .backends
            .schemas
            .list_attribute_schemas()
            .await
            .map_err(BridgeError::backend("searchableAttributes"))?;
        let mut fields = mapper::attribute_schemas_to_filter_fields(&schemas, &self.locale);

        let response = self
            .backends
            .categories
            .list(CategoryListArgs {
                limit: CATEGORY_FIELD_LIMIT,
                ..Default::default()
            })
            .await
            .map_err(BridgeError::backend("searchableAttributes"))?;
        let categories: Vec<Category> = response
            .results
            .iter()
            .map(|raw| mapper::category_to_category(raw, &self.locale))
            .collect();
        fields.push(mapper::categories_to_filter_field(&categories));

        Ok(fields)
    }
}

fn non_empty(values: Vec<String>) -> Option<Vec<String>> {
    (!values.is_empty()).then_some(values)
}
