//! Application configuration
//!
//! Layered sources: optional config files, then `APP__`-prefixed
//! environment variables, then a handful of conventional standalone
//! variables (API keys, `REDIS_URL`, `DATABASE_URL`) that override the
//! file-provided values when set.

use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cache: CacheSettings,
    pub providers: ProviderSettings,
    pub storage: StorageSettings,
    pub executor: ExecutorSettings,
    /// Enables the cache stats/clear endpoints
    pub debug_endpoints: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub redis_url: Option<String>,
    pub key_prefix: Option<String>,
    pub max_memory_entries: usize,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProviderSettings {
    pub weather_api_key: Option<String>,
    pub news_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
}

/// Which backend stores chains and run history
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub database_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutorSettings {
    pub step_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            key_prefix: None,
            max_memory_entries: 1000,
        }
    }
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            step_timeout_secs: 60,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut app_config: AppConfig = config.try_deserialize()?;
        app_config.apply_env_overrides();
        Ok(app_config)
    }

    /// Conventional standalone variables win over file values.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("WEATHER_API_KEY") {
            self.providers.weather_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("NEWS_API_KEY") {
            self.providers.news_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY").or_else(|_| std::env::var("OPENAI_API_KEY"))
        {
            self.providers.gemini_api_key = Some(key);
        }
        if let Ok(url) = std::env::var("REDIS_URL") {
            self.cache.redis_url = Some(url);
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.storage.database_url = Some(url);
            self.storage.backend = StorageBackend::Postgres;
        }
    }
}
