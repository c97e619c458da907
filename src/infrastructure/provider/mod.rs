//! Provider implementations - external data APIs and text generation

mod gemini;
mod http_data;
mod rate_limit;

pub use gemini::{GeminiGenerator, GeminiGeneratorConfig};
pub use http_data::{HttpDataFetcher, HttpDataFetcherConfig};
pub use rate_limit::{Clock, RateLimiter, RateLimiterConfig, SystemClock, Throttle};
