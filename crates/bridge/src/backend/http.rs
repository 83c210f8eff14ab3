//! REST client for the commerce platform.
//!
//! Authenticates with the client-credentials grant and keeps the access
//! token until shortly before it expires.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::debug;
use url::Url;

use super::types::{
    AttributeSchema, PagedResponse, ProductSearchResponse, RawCategory, RawInventoryEntry,
    RawProductType,
};
use super::{
    CatalogSchemaClient, CategoryClient, CategoryListArgs, InventoryClient, InventoryListArgs,
    ProductSearchClient, SearchArgs,
};
use crate::error::{BackendError, BackendResult};

/// Tokens are refreshed this long before they expire.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Longest token lifetime honored, whatever the auth server reports.
const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(48 * 60 * 60);

/// Product types fetched per schema listing (platform maximum).
const PRODUCT_TYPE_LIMIT: u32 = 500;

/// Connection settings for the platform API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API host (e.g. `https://api.europe-west1.gcp.commercetools.com`).
    pub host_url: String,
    /// Auth host (e.g. `https://auth.europe-west1.gcp.commercetools.com`).
    pub auth_url: String,
    pub project_key: String,
    pub client_id: String,
    pub client_secret: String,
    /// OAuth scope; defaults to `manage_project:<project_key>`.
    pub scope: Option<String>,
    /// Transport timeout for every request.
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn new(value: String, expires_in: u64, now: Instant) -> Self {
        let lifetime = Duration::from_secs(expires_in).min(MAX_TOKEN_LIFETIME);
        Self {
            value,
            expires_at: now.checked_add(lifetime).unwrap_or(now),
        }
    }

    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_EXPIRY_MARGIN < self.expires_at
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// REST client implementing every backend trait.
pub struct HttpCommerceClient {
    client: reqwest::Client,
    config: ClientConfig,
    api_base: Url,
    token: Mutex<Option<AccessToken>>,
}

impl HttpCommerceClient {
    /// Create a new client. Fails if the configured URLs are invalid.
    pub fn new(config: ClientConfig) -> BackendResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        let api_base = Url::parse(&format!(
            "{}/{}/",
            config.host_url.trim_end_matches('/'),
            config.project_key
        ))
        .map_err(|e| BackendError::Other(format!("invalid host url: {e}")))?;

        Ok(Self {
            client,
            config,
            api_base,
            token: Mutex::new(None),
        })
    }

    /// Get a valid access token, requesting a new one when needed.
    async fn access_token(&self) -> BackendResult<String> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.value.clone());
        }

        let url = format!("{}/oauth/token", self.config.auth_url.trim_end_matches('/'));
        let scope = self
            .config
            .scope
            .clone()
            .unwrap_or_else(|| format!("manage_project:{}", self.config.project_key));

        debug!(url = %url, "requesting access token");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials"), ("scope", scope.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BackendError::Auth(format!("status {}: {body}", status.as_u16())));
        }

        let token: TokenResponse = serde_json::from_str(&body)?;
        let value = token.access_token.clone();
        *guard = Some(AccessToken::new(
            token.access_token,
            token.expires_in,
            Instant::now(),
        ));

        Ok(value)
    }

    /// GET a project endpoint and decode its JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> BackendResult<T> {
        let token = self.access_token().await?;
        let url = self
            .api_base
            .join(path)
            .map_err(|e| BackendError::Other(format!("invalid endpoint {path}: {e}")))?;

        debug!(url = %url, params = query.len(), "backend request");

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ProductSearchClient for HttpCommerceClient {
    async fn search(&self, args: SearchArgs) -> BackendResult<ProductSearchResponse> {
        self.get_json("product-projections/search", &args.to_query_pairs())
            .await
    }
}

#[async_trait]
impl CategoryClient for HttpCommerceClient {
    async fn list(&self, args: CategoryListArgs) -> BackendResult<PagedResponse<RawCategory>> {
        self.get_json("categories", &args.to_query_pairs()).await
    }
}

#[async_trait]
impl CatalogSchemaClient for HttpCommerceClient {
    async fn list_attribute_schemas(&self) -> BackendResult<Vec<AttributeSchema>> {
        let query = [("limit".to_string(), PRODUCT_TYPE_LIMIT.to_string())];
        let page: PagedResponse<RawProductType> = self.get_json("product-types", &query).await?;

        debug!(product_types = page.results.len(), "loaded product types");

        Ok(page
            .results
            .into_iter()
            .flat_map(|product_type| product_type.attributes)
            .collect())
    }
}

#[async_trait]
impl InventoryClient for HttpCommerceClient {
    async fn list_inventory(
        &self,
        args: InventoryListArgs,
    ) -> BackendResult<PagedResponse<RawInventoryEntry>> {
        self.get_json("inventory", &args.to_query_pairs()).await
    }
}
