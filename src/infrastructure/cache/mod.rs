//! Cache backends and runtime selection

mod factory;
mod fallback;
mod in_memory;
mod redis;

pub use factory::{CacheConfig, CacheFactory};
pub use fallback::FallbackCache;
pub use in_memory::{InMemoryCache, InMemoryCacheConfig};
pub use redis::{RedisCache, RedisCacheConfig};
