//! Attribute schema cache.
//!
//! Product type schemas change rarely; caching them saves one backend call
//! per product query. Failures are never cached.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::debug;

use super::CatalogSchemaClient;
use super::types::AttributeSchema;
use crate::error::BackendResult;

const SCHEMA_KEY: &str = "attribute_schemas";

/// Caching decorator for a [`CatalogSchemaClient`].
pub struct CachedSchemaClient {
    inner: Arc<dyn CatalogSchemaClient>,
    cache: Cache<&'static str, Arc<Vec<AttributeSchema>>>,
}

impl CachedSchemaClient {
    /// Wrap `inner`, keeping its schemas for `ttl`.
    pub fn new(inner: Arc<dyn CatalogSchemaClient>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1)
            .time_to_live(ttl)
            .build();

        Self { inner, cache }
    }

    /// Drop the cached schemas.
    pub async fn invalidate(&self) {
        self.cache.invalidate(SCHEMA_KEY).await;
    }
}

#[async_trait]
impl CatalogSchemaClient for CachedSchemaClient {
    async fn list_attribute_schemas(&self) -> BackendResult<Vec<AttributeSchema>> {
        if let Some(schemas) = self.cache.get(SCHEMA_KEY).await {
            debug!("attribute schema cache hit");
            return Ok(schemas.as_ref().clone());
        }

        let schemas = self.inner.list_attribute_schemas().await?;
        self.cache
            .insert(SCHEMA_KEY, Arc::new(schemas.clone()))
            .await;

        Ok(schemas)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::backend::types::RawAttributeType;
    use crate::error::BackendError;

    struct CountingSchemas {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl CatalogSchemaClient for CountingSchemas {
        async fn list_attribute_schemas(&self) -> BackendResult<Vec<AttributeSchema>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(BackendError::Other("down".to_string()));
            }
            Ok(vec![AttributeSchema {
                name: "color".to_string(),
                label: Default::default(),
                attribute_type: RawAttributeType::named("enum"),
                is_searchable: true,
            }])
        }
    }

    #[tokio::test]
    async fn second_call_is_served_from_cache() {
        let inner = Arc::new(CountingSchemas {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let cached = CachedSchemaClient::new(inner.clone(), Duration::from_secs(60));

        let first = cached.list_attribute_schemas().await.unwrap();
        let second = cached.list_attribute_schemas().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        cached.invalidate().await;
        cached.list_attribute_schemas().await.unwrap();
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let inner = Arc::new(CountingSchemas {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let cached = CachedSchemaClient::new(inner.clone(), Duration::from_secs(60));

        assert!(cached.list_attribute_schemas().await.is_err());
        assert!(cached.list_attribute_schemas().await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }
}
