//! Cache domain - caching abstraction and key scheme

mod key;
mod repository;
mod response;

pub use key::{cache_key, sanitize_key, truncate_prompt, TRUNCATED_PROMPT_LEN};
pub use repository::{Cache, CacheExt, CacheStats};
pub use response::{ResponseCache, ResponseCacheConfig};

#[cfg(test)]
pub use repository::mock::MockCache;
