//! Chainflow
//!
//! Chained AI workflow execution engine: ordered steps of data-fetch +
//! text-generation with per-step response caching, context accumulation
//! and failure tolerance.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;
use std::time::Duration;

use api::state::AppState;
use domain::cache::ResponseCache;
use domain::chain::{ChainRepository, RunRecordRepository};
use infrastructure::cache::{CacheConfig, CacheFactory};
use infrastructure::chain::{
    connect_pool, ensure_schema, ChainExecutorImpl, ExecutorConfig, InMemoryChainRepository,
    InMemoryRunRecordRepository, PostgresChainRepository, PostgresConfig,
    PostgresRunRecordRepository,
};
use infrastructure::provider::{
    GeminiGenerator, GeminiGeneratorConfig, HttpDataFetcher, HttpDataFetcherConfig,
};

/// Wires the full application state from configuration.
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let cache_config = CacheConfig {
        redis_url: config.cache.redis_url.clone(),
        key_prefix: config.cache.key_prefix.clone(),
        max_memory_entries: config.cache.max_memory_entries,
        ..Default::default()
    };
    let cache = ResponseCache::new(CacheFactory::new().create(&cache_config).await?);

    let fetcher = Arc::new(HttpDataFetcher::new(HttpDataFetcherConfig {
        weather_api_key: config.providers.weather_api_key.clone(),
        news_api_key: config.providers.news_api_key.clone(),
        ..Default::default()
    })?);

    let generator = Arc::new(GeminiGenerator::new(GeminiGeneratorConfig {
        api_key: config.providers.gemini_api_key.clone(),
        ..Default::default()
    })?);

    let (chains, runs) = create_repositories(config).await?;

    let executor = Arc::new(ChainExecutorImpl::with_config(
        fetcher,
        generator,
        cache.clone(),
        chains.clone(),
        runs.clone(),
        ExecutorConfig {
            step_timeout: Duration::from_secs(config.executor.step_timeout_secs),
        },
    ));

    Ok(AppState {
        executor,
        chains,
        runs,
        cache,
        debug_endpoints: config.debug_endpoints,
    })
}

async fn create_repositories(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn ChainRepository>, Arc<dyn RunRecordRepository>)> {
    match config.storage.backend {
        config::StorageBackend::Memory => Ok((
            Arc::new(InMemoryChainRepository::new()),
            Arc::new(InMemoryRunRecordRepository::new()),
        )),
        config::StorageBackend::Postgres => {
            let url = config.storage.database_url.clone().ok_or_else(|| {
                anyhow::anyhow!("database_url is required for the postgres storage backend")
            })?;
            let pool = connect_pool(&PostgresConfig::new(url)).await?;
            ensure_schema(&pool).await?;
            Ok((
                Arc::new(PostgresChainRepository::new(pool.clone())),
                Arc::new(PostgresRunRecordRepository::new(pool)),
            ))
        }
    }
}
