//! In-memory cache implementation
//!
//! Bounded map with insertion-order eviction and lazy expiry. Expired
//! entries are dropped on read; no background sweeper runs. This is the
//! fallback backend when Redis is unreachable, so the entry cap is a
//! hard bound, not a hint.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tracing::debug;

use crate::domain::cache::{Cache, CacheStats};
use crate::domain::DomainError;

/// Configuration for the in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Hard cap on entry count
    pub max_entries: usize,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self { max_entries: 1000 }
    }
}

impl InMemoryCacheConfig {
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }
}

#[derive(Debug)]
struct Entry {
    value: String,
    /// Epoch millis after which the entry is dead.
    expires_at_ms: i64,
}

impl Entry {
    fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, Entry>,
    /// Keys in insertion order; drives eviction when over capacity.
    insertion_order: VecDeque<String>,
}

/// Bounded in-memory cache with FIFO eviction
#[derive(Debug)]
pub struct InMemoryCache {
    state: Mutex<CacheState>,
    config: InMemoryCacheConfig,
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        Self {
            state: Mutex::new(CacheState::default()),
            config,
        }
    }

    fn now_ms() -> i64 {
        Utc::now().timestamp_millis()
    }

    /// Removes an entry together with its insertion-order slot, so a
    /// later re-insert of the same key gets a fresh FIFO position.
    fn purge(state: &mut CacheState, key: &str) -> bool {
        let removed = state.entries.remove(key).is_some();
        if removed {
            state.insertion_order.retain(|k| k != key);
        }
        removed
    }

    /// Evicts oldest-inserted entries until the cap holds. Order entries
    /// whose key was already overwritten or expired away are skipped.
    fn evict_over_capacity(state: &mut CacheState, max_entries: usize) {
        while state.entries.len() > max_entries {
            match state.insertion_order.pop_front() {
                Some(oldest) => {
                    if state.entries.remove(&oldest).is_some() {
                        debug!(key = %oldest, "evicted oldest cache entry");
                    }
                }
                None => break,
            }
        }
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        let now = Self::now_ms();
        let mut state = self.state.lock().unwrap();

        match state.entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                Self::purge(&mut state, key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> Result<(), DomainError> {
        let expires_at_ms = Self::now_ms() + ttl.as_millis() as i64;
        let mut state = self.state.lock().unwrap();

        let replaced = state
            .entries
            .insert(
                key.to_string(),
                Entry {
                    value: value.to_string(),
                    expires_at_ms,
                },
            )
            .is_some();

        // Overwrites keep their original insertion position.
        if !replaced {
            state.insertion_order.push_back(key.to_string());
        }

        Self::evict_over_capacity(&mut state, self.config.max_entries);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        let mut state = self.state.lock().unwrap();
        Ok(Self::purge(&mut state, key))
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, DomainError> {
        let now = Self::now_ms();
        let state = self.state.lock().unwrap();

        Ok(state.entries.get(key).and_then(|entry| {
            let remaining_ms = entry.expires_at_ms - now;
            if remaining_ms > 0 {
                Some(Duration::from_millis(remaining_ms as u64))
            } else {
                None
            }
        }))
    }

    async fn clear(&self) -> Result<(), DomainError> {
        let mut state = self.state.lock().unwrap();
        state.entries.clear();
        state.insertion_order.clear();
        Ok(())
    }

    async fn stats(&self) -> Result<CacheStats, DomainError> {
        let now = Self::now_ms();
        let state = self.state.lock().unwrap();
        let live = state
            .entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count();

        Ok(CacheStats {
            backend: "memory".to_string(),
            redis_available: false,
            entries: live,
        })
    }
}
