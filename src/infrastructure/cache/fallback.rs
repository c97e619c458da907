//! Redis-primary, in-memory-fallback cache
//!
//! Every operation is tried against the primary first; on primary error
//! the fallback answers instead and the error is logged, not returned.
//! Reads that miss the primary also consult the fallback, so entries
//! written while Redis was down stay readable after it recovers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::cache::{Cache, CacheStats};
use crate::domain::DomainError;

/// Two-tier cache: a primary backend with a local fallback.
#[derive(Debug)]
pub struct FallbackCache {
    primary: Arc<dyn Cache>,
    fallback: Arc<dyn Cache>,
}

impl FallbackCache {
    pub fn new(primary: Arc<dyn Cache>, fallback: Arc<dyn Cache>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl Cache for FallbackCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        match self.primary.get_raw(key).await {
            Ok(Some(value)) => Ok(Some(value)),
            Ok(None) => self.fallback.get_raw(key).await,
            Err(e) => {
                warn!(key = %key, error = %e, "primary cache get failed, using fallback");
                self.fallback.get_raw(key).await
            }
        }
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        match self.primary.set_raw(key, value, ttl).await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(key = %key, error = %e, "primary cache set failed, using fallback");
                self.fallback.set_raw(key, value, ttl).await
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        // Delete from both tiers so a fallback copy cannot resurrect.
        let fallback_deleted = self.fallback.delete(key).await.unwrap_or(false);
        match self.primary.delete(key).await {
            Ok(primary_deleted) => Ok(primary_deleted || fallback_deleted),
            Err(e) => {
                warn!(key = %key, error = %e, "primary cache delete failed");
                Ok(fallback_deleted)
            }
        }
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        match self.primary.ttl(key).await {
            Ok(Some(ttl)) => Ok(Some(ttl)),
            Ok(None) => self.fallback.ttl(key).await,
            Err(e) => {
                warn!(key = %key, error = %e, "primary cache ttl failed, using fallback");
                self.fallback.ttl(key).await
            }
        }
    }

    async fn clear(&self) -> Result<(), DomainError> {
        if let Err(e) = self.fallback.clear().await {
            warn!(error = %e, "fallback cache clear failed");
        }
        match self.primary.clear().await {
            Ok(()) => Ok(()),
            Err(e) => {
                warn!(error = %e, "primary cache clear failed");
                Ok(())
            }
        }
    }

    async fn stats(&self) -> Result<CacheStats, DomainError> {
        match self.primary.stats().await {
            Ok(stats) => Ok(stats),
            Err(e) => {
                warn!(error = %e, "primary cache stats failed, reporting fallback");
                let mut stats = self.fallback.stats().await?;
                stats.redis_available = false;
                Ok(stats)
            }
        }
    }
}
