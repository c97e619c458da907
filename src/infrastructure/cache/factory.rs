//! Cache factory for runtime backend selection
//!
//! When a Redis URL is configured and reachable at startup the factory
//! builds a Redis-primary cache with an in-memory fallback; otherwise
//! it degrades to memory-only and logs the downgrade.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::domain::cache::Cache;
use crate::domain::DomainError;

use super::fallback::FallbackCache;
use super::in_memory::{InMemoryCache, InMemoryCacheConfig};
use super::redis::{RedisCache, RedisCacheConfig};

/// Configuration for the cache factory
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Redis URL; `None` means memory-only
    pub redis_url: Option<String>,
    /// Key prefix for namespacing in Redis
    pub key_prefix: Option<String>,
    /// Entry cap for the in-memory tier
    pub max_memory_entries: usize,
    /// Redis connection timeout
    pub connection_timeout: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            key_prefix: None,
            max_memory_entries: 1000,
            connection_timeout: Duration::from_secs(5),
        }
    }
}

impl CacheConfig {
    pub fn in_memory() -> Self {
        Self::default()
    }

    pub fn redis(url: impl Into<String>) -> Self {
        Self {
            redis_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }

    pub fn with_max_memory_entries(mut self, max_entries: usize) -> Self {
        self.max_memory_entries = max_entries;
        self
    }
}

/// Factory for creating cache instances
#[derive(Debug, Default)]
pub struct CacheFactory;

impl CacheFactory {
    pub fn new() -> Self {
        Self
    }

    /// Creates the configured cache, degrading to memory-only when Redis
    /// is configured but unreachable. Never fails on connectivity.
    pub async fn create(&self, config: &CacheConfig) -> Result<Arc<dyn Cache>, DomainError> {
        let memory = self.create_in_memory(config.max_memory_entries);

        let Some(url) = &config.redis_url else {
            info!("no Redis URL configured, using in-memory cache");
            return Ok(memory);
        };

        let mut redis_config =
            RedisCacheConfig::new(url.clone()).with_connection_timeout(config.connection_timeout);
        if let Some(prefix) = &config.key_prefix {
            redis_config = redis_config.with_key_prefix(prefix.clone());
        }

        match RedisCache::new(redis_config).await {
            Ok(redis) => {
                info!(url = %url, "connected to Redis, in-memory fallback armed");
                Ok(Arc::new(FallbackCache::new(Arc::new(redis), memory)))
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Redis unreachable, degrading to in-memory cache");
                Ok(memory)
            }
        }
    }

    fn create_in_memory(&self, max_entries: usize) -> Arc<dyn Cache> {
        Arc::new(InMemoryCache::with_config(
            InMemoryCacheConfig::default().with_max_entries(max_entries),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::CacheExt;

    #[test]
    fn test_cache_config_builders() {
        let config = CacheConfig::redis("redis://localhost:6379")
            .with_key_prefix("chainflow")
            .with_max_memory_entries(500);

        assert_eq!(config.redis_url, Some("redis://localhost:6379".to_string()));
        assert_eq!(config.key_prefix, Some("chainflow".to_string()));
        assert_eq!(config.max_memory_entries, 500);

        assert!(CacheConfig::in_memory().redis_url.is_none());
    }

    #[tokio::test]
    async fn test_factory_create_in_memory() {
        let factory = CacheFactory::new();
        let cache = factory.create(&CacheConfig::in_memory()).await.unwrap();

        cache
            .set("test", &"value", Duration::from_secs(60))
            .await
            .unwrap();

        let result: Option<String> = cache.get("test").await.unwrap();
        assert_eq!(result, Some("value".to_string()));

        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.backend, "memory");
    }

    #[tokio::test]
    async fn test_factory_degrades_when_redis_unreachable() {
        let factory = CacheFactory::new();
        let config = CacheConfig {
            redis_url: Some("redis://127.0.0.1:1".to_string()),
            connection_timeout: Duration::from_millis(200),
            ..Default::default()
        };

        // Unreachable Redis must not fail creation.
        let cache = factory.create(&config).await.unwrap();
        let stats = cache.stats().await.unwrap();
        assert_eq!(stats.backend, "memory");
        assert!(!stats.redis_available);
    }
}
