//! Cache trait definition

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainError;

/// Point-in-time cache statistics, served by the stats endpoint.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheStats {
    /// Which backend is currently serving reads/writes
    pub backend: String,
    /// Whether the durable store is reachable
    pub redis_available: bool,
    /// Approximate entry count
    pub entries: usize,
}

/// Key-value cache with per-entry TTL.
///
/// Stores raw JSON strings so the trait stays dyn-compatible; typed
/// access goes through [`CacheExt`].
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    /// Gets a raw JSON value, `None` on miss or expiry.
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Stores a raw JSON value with a TTL.
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError>;

    /// Deletes a key, returning whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, DomainError>;

    /// Checks whether a key exists and is not expired.
    async fn exists(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.get_raw(key).await?.is_some())
    }

    /// Remaining TTL for a key, `None` if absent or expired.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError>;

    /// Removes all entries.
    async fn clear(&self) -> Result<(), DomainError>;

    /// Backend and size information.
    async fn stats(&self) -> Result<CacheStats, DomainError>;
}

/// Extension trait providing typed get/set over the raw JSON operations.
pub trait CacheExt: Cache {
    fn get<'a, V>(
        &'a self,
        key: &'a str,
    ) -> impl std::future::Future<Output = Result<Option<V>, DomainError>> + Send
    where
        V: DeserializeOwned + Send,
    {
        async move {
            match self.get_raw(key).await? {
                Some(data) => {
                    let value: V = serde_json::from_str(&data).map_err(|e| {
                        DomainError::cache(format!("Failed to deserialize cache value: {}", e))
                    })?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    fn set<'a, V>(
        &'a self,
        key: &'a str,
        value: &'a V,
        ttl: Duration,
    ) -> impl std::future::Future<Output = Result<(), DomainError>> + Send
    where
        V: Serialize + Send + Sync,
    {
        async move {
            let data = serde_json::to_string(value).map_err(|e| {
                DomainError::cache(format!("Failed to serialize cache value: {}", e))
            })?;
            self.set_raw(key, &data, ttl).await
        }
    }
}

// Blanket implementation for all types implementing Cache
impl<T: Cache + ?Sized> CacheExt for T {}
