//! Response cache - the namespaced key scheme over the raw cache
//!
//! Two namespaces matter to the chain executor: `api_response` for
//! capability-fetch payloads and `chain_result` for whole-chain
//! memoization. Cache failures are swallowed here (logged, degraded to a
//! miss or a no-op): callers never see a cache error as fatal.

use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use super::key::{cache_key, truncate_prompt};
use super::repository::{Cache, CacheExt, CacheStats};
use crate::domain::action::ActionKind;

const API_RESPONSE_PREFIX: &str = "api_response";
const CHAIN_RESULT_PREFIX: &str = "chain_result";

/// TTLs for the two response-cache namespaces.
#[derive(Debug, Clone)]
pub struct ResponseCacheConfig {
    pub api_response_ttl: Duration,
    pub chain_result_ttl: Duration,
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        Self {
            api_response_ttl: Duration::from_secs(600),
            chain_result_ttl: Duration::from_secs(1800),
        }
    }
}

/// Namespaced, failure-tolerant view over the backing cache.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    inner: Arc<dyn Cache>,
    config: ResponseCacheConfig,
}

impl ResponseCache {
    pub fn new(inner: Arc<dyn Cache>) -> Self {
        Self::with_config(inner, ResponseCacheConfig::default())
    }

    pub fn with_config(inner: Arc<dyn Cache>, config: ResponseCacheConfig) -> Self {
        Self { inner, config }
    }

    /// Key for a capability-fetch payload.
    pub fn api_response_key(action: ActionKind, prompt: &str) -> String {
        cache_key(
            API_RESPONSE_PREFIX,
            &[action.as_str(), &truncate_prompt(prompt)],
        )
    }

    /// Key for a whole-chain result.
    pub fn chain_result_key(chain_id: &str, prompt: &str) -> String {
        cache_key(CHAIN_RESULT_PREFIX, &[chain_id, &truncate_prompt(prompt)])
    }

    /// Looks up a cached fetch payload; any cache failure degrades to a miss.
    pub async fn get_api_response(&self, action: ActionKind, prompt: &str) -> Option<String> {
        let key = Self::api_response_key(action, prompt);
        match self.inner.get::<String>(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key = %key, error = %e, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    /// Stores a fetch payload; any cache failure is logged and dropped.
    pub async fn put_api_response(&self, action: ActionKind, prompt: &str, payload: &str) -> String {
        let key = Self::api_response_key(action, prompt);
        if let Err(e) = self
            .inner
            .set(&key, &payload, self.config.api_response_ttl)
            .await
        {
            warn!(key = %key, error = %e, "cache store failed, continuing uncached");
        }
        key
    }

    /// Whole-chain memoization lookup (not used by the per-step loop).
    pub async fn get_chain_result<V>(&self, chain_id: &str, prompt: &str) -> Option<V>
    where
        V: DeserializeOwned + Send,
    {
        let key = Self::chain_result_key(chain_id, prompt);
        match self.inner.get::<V>(&key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key = %key, error = %e, "cache lookup failed, treating as miss");
                None
            }
        }
    }

    /// Whole-chain memoization store.
    pub async fn put_chain_result<V>(&self, chain_id: &str, prompt: &str, result: &V) -> String
    where
        V: Serialize + Send + Sync,
    {
        let key = Self::chain_result_key(chain_id, prompt);
        if let Err(e) = self
            .inner
            .set(&key, result, self.config.chain_result_ttl)
            .await
        {
            warn!(key = %key, error = %e, "cache store failed, continuing uncached");
        }
        key
    }

    pub async fn delete(&self, key: &str) -> bool {
        match self.inner.delete(key).await {
            Ok(existed) => existed,
            Err(e) => {
                warn!(key = %key, error = %e, "cache delete failed");
                false
            }
        }
    }

    pub async fn clear(&self) {
        if let Err(e) = self.inner.clear().await {
            warn!(error = %e, "cache clear failed");
        }
    }

    pub async fn stats(&self) -> CacheStats {
        match self.inner.stats().await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(error = %e, "cache stats unavailable");
                CacheStats {
                    backend: "unavailable".to_string(),
                    redis_available: false,
                    entries: 0,
                }
            }
        }
    }
}
