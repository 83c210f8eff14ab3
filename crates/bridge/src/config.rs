//! Configuration loaded from environment variables.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use crate::backend::ClientConfig;
use crate::catalog::QuerySettings;

/// Bridge configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Commerce platform API host.
    pub host_url: String,

    /// Commerce platform auth host.
    pub auth_url: String,

    pub project_key: String,

    pub client_id: String,

    pub client_secret: String,

    /// OAuth scope (default: `manage_project:<project_key>`).
    pub scope: Option<String>,

    /// Page size when a query has no limit (default: 24).
    pub default_page_limit: u32,

    /// Largest page size a query may request (default: 500).
    pub max_page_limit: u32,

    /// Backend request timeout (default: 30s).
    pub request_timeout: Duration,

    /// Attribute schema cache TTL; zero disables the cache (default: 0).
    pub schema_cache_ttl: Duration,

    /// Currency when neither the locale nor the request names one (default: USD).
    pub default_currency: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let host_url = env::var("COMMERCE_HOST_URL")
            .context("COMMERCE_HOST_URL environment variable is required")?;

        let auth_url = env::var("COMMERCE_AUTH_URL")
            .context("COMMERCE_AUTH_URL environment variable is required")?;

        let project_key = env::var("COMMERCE_PROJECT_KEY")
            .context("COMMERCE_PROJECT_KEY environment variable is required")?;

        let client_id = env::var("COMMERCE_CLIENT_ID")
            .context("COMMERCE_CLIENT_ID environment variable is required")?;

        let client_secret = env::var("COMMERCE_CLIENT_SECRET")
            .context("COMMERCE_CLIENT_SECRET environment variable is required")?;

        let scope = env::var("COMMERCE_SCOPE").ok().filter(|s| !s.is_empty());

        let default_page_limit = env::var("DEFAULT_PAGE_LIMIT")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .context("DEFAULT_PAGE_LIMIT must be a valid u32")?;

        let max_page_limit = env::var("MAX_PAGE_LIMIT")
            .unwrap_or_else(|_| "500".to_string())
            .parse()
            .context("MAX_PAGE_LIMIT must be a valid u32")?;

        if default_page_limit == 0 || default_page_limit > max_page_limit {
            bail!("DEFAULT_PAGE_LIMIT must be between 1 and MAX_PAGE_LIMIT");
        }

        let request_timeout = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .map(Duration::from_secs)
            .context("REQUEST_TIMEOUT_SECS must be a valid u64")?;

        let schema_cache_ttl = env::var("SCHEMA_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .map(Duration::from_secs)
            .context("SCHEMA_CACHE_TTL_SECS must be a valid u64")?;

        let default_currency = env::var("DEFAULT_CURRENCY")
            .unwrap_or_else(|_| "USD".to_string())
            .to_uppercase();

        Ok(Self {
            host_url,
            auth_url,
            project_key,
            client_id,
            client_secret,
            scope,
            default_page_limit,
            max_page_limit,
            request_timeout,
            schema_cache_ttl,
            default_currency,
        })
    }

    /// Settings for the backend client.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            host_url: self.host_url.clone(),
            auth_url: self.auth_url.clone(),
            project_key: self.project_key.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            scope: self.scope.clone(),
            timeout: self.request_timeout,
        }
    }

    pub fn query_settings(&self) -> QuerySettings {
        QuerySettings {
            default_limit: self.default_page_limit,
            max_limit: self.max_page_limit,
        }
    }
}
