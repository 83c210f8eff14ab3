//! Storefront actions.
//!
//! An action turns a request (query parameters plus headers) into a JSON
//! response. Each action resolves the locale first; a request without one
//! fails before any backend call.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::backend::Backends;
use crate::catalog::{
    CategoryFormat, CategoryQuery, ProductApi, ProductQuery, ProductQueryFactory, QueryResult,
    QuerySettings,
    types::{value_as_i64, value_as_string},
};
use crate::error::{BridgeError, BridgeResult};
use crate::locale::Locale;
use crate::models::{FilterField, Inventory, Product};

/// An incoming action request.
#[derive(Debug, Clone, Default)]
pub struct ActionRequest {
    pub query: Map<String, Value>,
    /// Header names are stored lowercase.
    headers: HashMap<String, String>,
}

impl ActionRequest {
    pub fn new(query: Map<String, Value>) -> Self {
        Self {
            query,
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    pub fn with_query(mut self, name: &str, value: Value) -> Self {
        self.query.insert(name.to_string(), value);
        self
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Query parameter as a string, if it is one.
    pub fn query_str(&self, name: &str) -> Option<&str> {
        self.query.get(name).and_then(Value::as_str)
    }
}

/// Response of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub status_code: u16,
    /// JSON body.
    pub body: String,
}

impl ActionResponse {
    /// Serialize `value` as the body.
    pub fn json<T: Serialize + ?Sized>(status_code: u16, value: &T) -> Self {
        match serde_json::to_string(value) {
            Ok(body) => Self { status_code, body },
            Err(error) => {
                tracing::error!(%error, "failed to serialize response body");
                Self {
                    status_code: 500,
                    body: r#"{"error":"serialization failed"}"#.to_string(),
                }
            }
        }
    }

    pub fn ok<T: Serialize + ?Sized>(value: &T) -> Self {
        Self::json(200, value)
    }
}

/// Product actions bound to a set of backends.
#[derive(Clone)]
pub struct ProductActions {
    backends: Backends,
    settings: QuerySettings,
    default_currency: String,
}

impl ProductActions {
    pub fn new(backends: Backends, settings: QuerySettings, default_currency: &str) -> Self {
        Self {
            backends,
            settings,
            default_currency: default_currency.to_string(),
        }
    }

    fn api(&self, request: &ActionRequest) -> BridgeResult<ProductApi> {
        let locale = Locale::from_request(request, &self.default_currency)?;
        Ok(ProductApi::new(self.backends.clone(), locale, self.settings))
    }

    /// Search products.
    pub async fn query(&self, request: &ActionRequest) -> ActionResponse {
        respond(self.run_query(request).await)
    }

    /// A single product by `id` or `sku`.
    pub async fn get_product(&self, request: &ActionRequest) -> ActionResponse {
        respond(self.run_get_product(request).await)
    }

    /// Stock level of the `sku` parameter.
    pub async fn get_inventory(&self, request: &ActionRequest) -> ActionResponse {
        respond(self.run_get_inventory(request).await)
    }

    /// Categories, flat or as a tree.
    pub async fn query_categories(&self, request: &ActionRequest) -> ActionResponse {
        respond(self.run_query_categories(request).await)
    }

    /// Attributes the storefront may filter on.
    pub async fn searchable_attributes(&self, request: &ActionRequest) -> ActionResponse {
        respond(self.run_searchable_attributes(request).await)
    }

    async fn run_query(&self, request: &ActionRequest) -> BridgeResult<QueryResult> {
        let api = self.api(request)?;
        let query = ProductQueryFactory::from_params(&request.query);
        match request.query_str("categorySlug") {
            Some(slug) => api.query_by_category_slug(slug, query).await,
            None => api.query(query).await,
        }
    }

    async fn run_get_product(&self, request: &ActionRequest) -> BridgeResult<Product> {
        let api = self.api(request)?;

        let id = request.query.get("id").and_then(value_as_string);
        let sku = request.query.get("sku").and_then(value_as_string);
        let query = match (id, sku) {
            (Some(id), _) => ProductQuery {
                product_ids: Some(vec![id]),
                ..Default::default()
            },
            (None, Some(sku)) => ProductQuery {
                skus: Some(vec![sku]),
                ..Default::default()
            },
            (None, None) => {
                return Err(BridgeError::BadRequest(
                    "either id or sku is required".to_string(),
                ));
            }
        };

        api.get_product(query).await?.ok_or(BridgeError::NotFound)
    }

    async fn run_get_inventory(&self, request: &ActionRequest) -> BridgeResult<Inventory> {
        let api = self.api(request)?;
        let sku = request
            .query
            .get("sku")
            .and_then(value_as_string)
            .ok_or_else(|| BridgeError::BadRequest("sku is required".to_string()))?;

        api.get_inventory(&sku).await?.ok_or(BridgeError::NotFound)
    }

    async fn run_query_categories(&self, request: &ActionRequest) -> BridgeResult<QueryResult> {
        let api = self.api(request)?;

        let format = match request.query_str("format") {
            Some("tree") => CategoryFormat::Tree,
            Some("flat") | None => CategoryFormat::Flat,
            Some(other) => {
                tracing::warn!(format = %other, "unknown category format, listing flat");
                CategoryFormat::Flat
            }
        };

        let query = CategoryQuery {
            limit: request
                .query
                .get("limit")
                .and_then(value_as_i64)
                .and_then(|l| u32::try_from(l).ok()),
            cursor: request.query.get("cursor").and_then(value_as_string),
            slug: request.query.get("slug").and_then(value_as_string),
            parent_id: request.query.get("parentId").and_then(value_as_string),
            format: Some(format),
        };

        api.query_categories(query, false).await
    }

    async fn run_searchable_attributes(
        &self,
        request: &ActionRequest,
    ) -> BridgeResult<Vec<FilterField>> {
        let api = self.api(request)?;
        api.searchable_attributes().await
    }
}

fn respond<T: Serialize>(result: BridgeResult<T>) -> ActionResponse {
    match result {
        Ok(value) => ActionResponse::ok(&value),
        Err(error) => error.into_response(),
    }
}
