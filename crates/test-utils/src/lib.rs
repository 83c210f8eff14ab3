//! Storefront bridge test utilities.
//!
//! Helpers for integration testing: platform record fixtures, an in-memory
//! fake backend, and assertion utilities for action responses.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use storefront_bridge::backend::types::{
    AttributeSchema, LocalizedString, RawAttribute, RawAttributeType, RawCategory,
    RawInventoryEntry, RawMoney, RawPrice, RawProductProjection, RawVariant, Reference,
};
use storefront_bridge::backend::{
    Backends, CatalogSchemaClient, CategoryClient, CategoryListArgs, InventoryClient,
    InventoryListArgs, PagedResponse, ProductSearchClient, ProductSearchResponse, RawFacetResult,
    SearchArgs,
};
use storefront_bridge::error::{BackendError, BackendResult};
use storefront_bridge::ActionRequest;

fn english(value: &str) -> LocalizedString {
    [("en".to_string(), value.to_string())].into_iter().collect()
}

/// Create a test product with an English name, slug and one priced variant.
pub fn test_product(id: &str, name: &str) -> TestProduct {
    TestProduct {
        raw: RawProductProjection {
            id: id.to_string(),
            name: english(name),
            slug: english(&name.to_lowercase().replace(' ', "-")),
            master_variant: RawVariant {
                id: 1,
                sku: Some(format!("SKU-{id}")),
                price: Some(price(1000, "USD")),
                ..Default::default()
            },
            ..Default::default()
        },
    }
}

fn price(cent_amount: i64, currency: &str) -> RawPrice {
    RawPrice {
        id: None,
        value: RawMoney {
            cent_amount,
            currency_code: currency.to_string(),
            fraction_digits: 2,
        },
        discounted: None,
    }
}

/// A product projection builder.
#[derive(Debug, Clone)]
pub struct TestProduct {
    raw: RawProductProjection,
}

impl TestProduct {
    /// Set the master variant SKU.
    pub fn with_sku(mut self, sku: &str) -> Self {
        self.raw.master_variant.sku = Some(sku.to_string());
        self
    }

    /// Set the master variant price.
    pub fn with_price(mut self, cent_amount: i64, currency: &str) -> Self {
        self.raw.master_variant.price = Some(price(cent_amount, currency));
        self
    }

    /// Add a category reference.
    pub fn in_category(mut self, category_id: &str) -> Self {
        self.raw.categories.push(Reference::new(category_id));
        self
    }

    /// Add a master variant attribute.
    pub fn with_attribute(mut self, name: &str, value: JsonValue) -> Self {
        self.raw
            .master_variant
            .attributes
            .push(RawAttribute {
                name: name.to_string(),
                value,
            });
        self
    }

    /// Remove the name in every language.
    pub fn unnamed(mut self) -> Self {
        self.raw.name.clear();
        self
    }

    pub fn build(self) -> RawProductProjection {
        self.raw
    }
}

/// Create a test category with an English name and slug.
pub fn test_category(id: &str, slug: &str) -> TestCategory {
    TestCategory {
        raw: RawCategory {
            id: id.to_string(),
            name: english(&slug.to_uppercase()),
            slug: english(slug),
            ..Default::default()
        },
    }
}

/// A category record builder.
#[derive(Debug, Clone)]
pub struct TestCategory {
    raw: RawCategory,
}

impl TestCategory {
    /// Set the parent; the parent is also the last ancestor.
    pub fn with_parent(mut self, parent_id: &str) -> Self {
        self.raw.parent = Some(Reference::new(parent_id));
        self.raw.ancestors.push(Reference::new(parent_id));
        self
    }

    pub fn with_order_hint(mut self, order_hint: &str) -> Self {
        self.raw.order_hint = order_hint.to_string();
        self
    }

    pub fn build(self) -> RawCategory {
        self.raw
    }
}

/// Create an attribute schema with an English label.
pub fn test_schema(name: &str, type_name: &str, searchable: bool) -> AttributeSchema {
    AttributeSchema {
        name: name.to_string(),
        label: english(name),
        attribute_type: RawAttributeType::named(type_name),
        is_searchable: searchable,
    }
}

/// Create an inventory entry for a SKU.
pub fn test_inventory(sku: &str, available_quantity: i64) -> RawInventoryEntry {
    RawInventoryEntry {
        id: format!("inv-{sku}"),
        sku: sku.to_string(),
        quantity_on_stock: available_quantity,
        available_quantity,
        ..Default::default()
    }
}

/// Create an action request with the locale header set.
pub fn test_request(locale: &str) -> ActionRequest {
    ActionRequest::default().with_header("frontastic-locale", locale)
}

/// In-memory backend implementing every client trait.
///
/// Category listings honor the `slug(..)`, `or id=` and `parent(..)`
/// predicates; inventory listings honor `sku=`; searches return the
/// configured response. Every call is recorded.
#[derive(Debug, Default)]
pub struct FakeBackend {
    search_response: ProductSearchResponse,
    categories: Vec<RawCategory>,
    schemas: Vec<AttributeSchema>,
    inventory: Vec<RawInventoryEntry>,
    fail_search: bool,
    fail_categories: bool,
    fail_schemas: bool,
    fail_inventory: bool,
    reject_id_lookup: bool,
    searches: Mutex<Vec<SearchArgs>>,
    category_lists: Mutex<Vec<CategoryListArgs>>,
    inventory_lists: Mutex<Vec<InventoryListArgs>>,
    schema_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Products returned by every search (one page holding all of them).
    pub fn with_products(mut self, products: Vec<RawProductProjection>) -> Self {
        let count = products.len() as u64;
        self.search_response.results = products;
        self.search_response.count = count;
        self.search_response.total = count;
        self
    }

    /// Override the paging numbers of the search response.
    pub fn with_page(mut self, offset: u64, total: u64) -> Self {
        self.search_response.offset = offset;
        self.search_response.total = total;
        self
    }

    pub fn with_facet(mut self, key: &str, result: RawFacetResult) -> Self {
        self.search_response.facets.insert(key.to_string(), result);
        self
    }

    pub fn with_categories(mut self, categories: Vec<RawCategory>) -> Self {
        self.categories = categories;
        self
    }

    pub fn with_schemas(mut self, schemas: Vec<AttributeSchema>) -> Self {
        self.schemas = schemas;
        self
    }

    pub fn with_inventory(mut self, entries: Vec<RawInventoryEntry>) -> Self {
        self.inventory = entries;
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    pub fn failing_categories(mut self) -> Self {
        self.fail_categories = true;
        self
    }

    pub fn failing_schemas(mut self) -> Self {
        self.fail_schemas = true;
        self
    }

    pub fn failing_inventory(mut self) -> Self {
        self.fail_inventory = true;
        self
    }

    /// Reject category predicates that include the `or id=` alternative.
    pub fn rejecting_id_lookup(mut self) -> Self {
        self.reject_id_lookup = true;
        self
    }

    /// Wrap in `Arc` and use for every backend role.
    pub fn into_backends(self) -> (Arc<Self>, Backends) {
        let fake = Arc::new(self);
        let backends = Backends::from_client(fake.clone());
        (fake, backends)
    }

    /// Recorded search calls.
    pub fn searches(&self) -> Vec<SearchArgs> {
        self.searches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded category listings.
    pub fn category_lists(&self) -> Vec<CategoryListArgs> {
        self.category_lists
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Recorded inventory listings.
    pub fn inventory_lists(&self) -> Vec<InventoryListArgs> {
        self.inventory_lists
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn schema_calls(&self) -> usize {
        self.schema_calls.load(Ordering::SeqCst)
    }

    /// Total number of backend calls.
    pub fn call_count(&self) -> usize {
        self.searches().len()
            + self.category_lists().len()
            + self.inventory_lists().len()
            + self.schema_calls()
    }

    fn unavailable() -> BackendError {
        BackendError::Status {
            status: 503,
            body: "service unavailable".to_string(),
        }
    }
}

/// Value of the first quoted string in a predicate.
fn quoted(clause: &str) -> Option<&str> {
    clause.split('"').nth(1)
}

#[async_trait]
impl ProductSearchClient for FakeBackend {
    async fn search(&self, args: SearchArgs) -> BackendResult<ProductSearchResponse> {
        self.searches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(args);
        if self.fail_search {
            return Err(Self::unavailable());
        }
        Ok(self.search_response.clone())
    }
}

#[async_trait]
impl CategoryClient for FakeBackend {
    async fn list(&self, args: CategoryListArgs) -> BackendResult<PagedResponse<RawCategory>> {
        self.category_lists
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(args.clone());
        if self.fail_categories {
            return Err(Self::unavailable());
        }

        let clauses = args.where_clauses.unwrap_or_default();
        if self.reject_id_lookup && clauses.iter().any(|c| c.contains(" or id=")) {
            return Err(BackendError::Status {
                status: 400,
                body: "malformed predicate".to_string(),
            });
        }

        let matching: Vec<RawCategory> = self
            .categories
            .iter()
            .filter(|category| {
                clauses.iter().all(|clause| {
                    let Some(value) = quoted(clause) else {
                        return true;
                    };
                    if clause.starts_with("slug(") {
                        category.slug.values().any(|s| s == value)
                            || (clause.contains(" or id=") && category.id == value)
                    } else if clause.starts_with("parent(") {
                        category.parent.as_ref().is_some_and(|p| p.id == value)
                    } else {
                        true
                    }
                })
            })
            .cloned()
            .collect();

        let total = matching.len() as u64;
        let offset = args.offset.unwrap_or(0);
        let results: Vec<RawCategory> = matching
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(args.limit as usize)
            .collect();

        Ok(PagedResponse {
            limit: Some(u64::from(args.limit)),
            count: results.len() as u64,
            total,
            offset,
            results,
        })
    }
}

#[async_trait]
impl CatalogSchemaClient for FakeBackend {
    async fn list_attribute_schemas(&self) -> BackendResult<Vec<AttributeSchema>> {
        self.schema_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_schemas {
            return Err(Self::unavailable());
        }
        Ok(self.schemas.clone())
    }
}

#[async_trait]
impl InventoryClient for FakeBackend {
    async fn list_inventory(
        &self,
        args: InventoryListArgs,
    ) -> BackendResult<PagedResponse<RawInventoryEntry>> {
        self.inventory_lists
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(args.clone());
        if self.fail_inventory {
            return Err(Self::unavailable());
        }

        let results: Vec<RawInventoryEntry> = self
            .inventory
            .iter()
            .filter(|entry| {
                args.where_clauses.iter().all(|clause| {
                    !clause.starts_with("sku=") || quoted(clause) == Some(entry.sku.as_str())
                })
            })
            .take(args.limit as usize)
            .cloned()
            .collect();

        Ok(PagedResponse {
            limit: Some(u64::from(args.limit)),
            count: results.len() as u64,
            total: results.len() as u64,
            offset: 0,
            results,
        })
    }
}

/// Assertion helpers for JSON content.
pub mod assert {
    use serde_json::Value;

    /// Parse an action response body.
    pub fn body(body: &str) -> Value {
        serde_json::from_str(body).unwrap_or_else(|e| panic!("invalid JSON body ({e}): {body}"))
    }

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a JSON value does not have a specific key.
    pub fn lacks_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_none(),
            "Expected JSON to NOT have key '{key}', got: {value}"
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to NOT contain '{needle}'\nActual: {haystack}"
        );
    }
}
