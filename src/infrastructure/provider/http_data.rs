//! HTTP-backed data fetcher for the three capabilities
//!
//! Each capability resolves upstream unavailability (missing key, HTTP
//! failure, unexpected body) into a documented placeholder payload
//! instead of erroring. Callers always get a string; the placeholder
//! path is logged, never silent.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

use crate::domain::action::ActionKind;
use crate::domain::provider::DataFetcher;
use crate::domain::DomainError;

const DEFAULT_WEATHER_BASE_URL: &str = "http://api.weatherapi.com";
const DEFAULT_NEWS_BASE_URL: &str = "https://newsapi.org";
const DEFAULT_GITHUB_BASE_URL: &str = "https://api.github.com";

const DEFAULT_WEATHER_LOCATION: &str = "Delhi,India";
const USER_AGENT: &str = concat!("chainflow/", env!("CARGO_PKG_VERSION"));

const PLACEHOLDER_WEATHER: &[&str] = &[
    "Sunny in Delhi, 32°C",
    "Cloudy in Mumbai, 28°C",
    "Rainy in Bangalore, 24°C",
    "Clear skies in Chennai, 35°C",
];

const PLACEHOLDER_GITHUB: &[&str] = &[
    "awesome-project by developer123 - 15.2k stars",
    "react-components by reactdev - 8.7k stars",
    "ml-toolkit by airesearcher - 12.1k stars",
    "web-framework by webmaster - 20.5k stars",
];

const PLACEHOLDER_NEWS: &[&str] = &[
    "Breaking: Tech innovation reaches new heights",
    "Breaking: Scientists make breakthrough discovery",
    "Breaking: Global markets show positive trends",
    "Breaking: New sustainable energy solutions emerge",
];

/// Configuration for the HTTP data fetcher
#[derive(Debug, Clone)]
pub struct HttpDataFetcherConfig {
    pub weather_api_key: Option<String>,
    pub news_api_key: Option<String>,
    pub weather_base_url: String,
    pub news_base_url: String,
    pub github_base_url: String,
    pub request_timeout: Duration,
}

impl Default for HttpDataFetcherConfig {
    fn default() -> Self {
        Self {
            weather_api_key: None,
            news_api_key: None,
            weather_base_url: DEFAULT_WEATHER_BASE_URL.to_string(),
            news_base_url: DEFAULT_NEWS_BASE_URL.to_string(),
            github_base_url: DEFAULT_GITHUB_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Fetches capability payloads from the live vendor APIs.
#[derive(Debug)]
pub struct HttpDataFetcher {
    client: reqwest::Client,
    config: HttpDataFetcherConfig,
}

#[derive(Debug, Deserialize)]
struct WeatherResponse {
    location: WeatherLocation,
    current: WeatherCurrent,
}

#[derive(Debug, Deserialize)]
struct WeatherLocation {
    name: String,
}

#[derive(Debug, Deserialize)]
struct WeatherCurrent {
    temp_c: f64,
    condition: WeatherCondition,
}

#[derive(Debug, Deserialize)]
struct WeatherCondition {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GithubSearchResponse {
    items: Vec<GithubRepo>,
}

#[derive(Debug, Deserialize)]
struct GithubRepo {
    name: String,
    owner: GithubOwner,
    stargazers_count: u64,
}

#[derive(Debug, Deserialize)]
struct GithubOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    articles: Vec<NewsArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsArticle {
    title: String,
}

impl HttpDataFetcher {
    pub fn new(config: HttpDataFetcherConfig) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                DomainError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client, config })
    }

    /// Documented placeholder payload for a capability, chosen at random.
    pub fn placeholder(action: ActionKind) -> String {
        let pool = match action {
            ActionKind::Weather => PLACEHOLDER_WEATHER,
            ActionKind::Github => PLACEHOLDER_GITHUB,
            ActionKind::News => PLACEHOLDER_NEWS,
        };
        pool.choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(pool[0])
            .to_string()
    }

    async fn fetch_weather(&self, prompt: &str) -> Result<String, DomainError> {
        let Some(key) = &self.config.weather_api_key else {
            warn!("no weather API key configured, serving placeholder");
            return Ok(Self::placeholder(ActionKind::Weather));
        };

        // The prompt doubles as the location query when present.
        let location = if prompt.trim().is_empty() {
            DEFAULT_WEATHER_LOCATION
        } else {
            prompt.trim()
        };

        let url = format!("{}/v1/current.json", self.config.weather_base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("key", key.as_str()), ("q", location), ("aqi", "no")])
            .send()
            .await
            .map_err(|e| DomainError::provider("weather", e.to_string()))?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "weather API error, serving placeholder");
            return Ok(Self::placeholder(ActionKind::Weather));
        }

        match response.json::<WeatherResponse>().await {
            Ok(weather) => Ok(format!(
                "{} in {}, {}°C",
                weather.current.condition.text,
                weather.location.name,
                weather.current.temp_c.round() as i64
            )),
            Err(e) => {
                warn!(error = %e, "unexpected weather API body, serving placeholder");
                Ok(Self::placeholder(ActionKind::Weather))
            }
        }
    }

    async fn fetch_github(&self) -> Result<String, DomainError> {
        let url = format!("{}/search/repositories", self.config.github_base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("q", "created:>2024-01-01"),
                ("sort", "stars"),
                ("order", "desc"),
                ("per_page", "1"),
            ])
            .send()
            .await
            .map_err(|e| DomainError::provider("github", e.to_string()))?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "GitHub API error, serving placeholder");
            return Ok(Self::placeholder(ActionKind::Github));
        }

        match response.json::<GithubSearchResponse>().await {
            Ok(search) => match search.items.into_iter().next() {
                Some(repo) => Ok(format!(
                    "{} by {} - {} stars",
                    repo.name, repo.owner.login, repo.stargazers_count
                )),
                None => Ok(Self::placeholder(ActionKind::Github)),
            },
            Err(e) => {
                warn!(error = %e, "unexpected GitHub API body, serving placeholder");
                Ok(Self::placeholder(ActionKind::Github))
            }
        }
    }

    async fn fetch_news(&self) -> Result<String, DomainError> {
        let Some(key) = &self.config.news_api_key else {
            warn!("no news API key configured, serving placeholder");
            return Ok(Self::placeholder(ActionKind::News));
        };

        let url = format!("{}/v2/top-headlines", self.config.news_base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("country", "us"), ("pageSize", "1"), ("apiKey", key.as_str())])
            .send()
            .await
            .map_err(|e| DomainError::provider("news", e.to_string()))?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "news API error, serving placeholder");
            return Ok(Self::placeholder(ActionKind::News));
        }

        match response.json::<NewsResponse>().await {
            Ok(news) => match news.articles.into_iter().next() {
                Some(article) => Ok(format!("Breaking: {}", article.title)),
                None => Ok(Self::placeholder(ActionKind::News)),
            },
            Err(e) => {
                warn!(error = %e, "unexpected news API body, serving placeholder");
                Ok(Self::placeholder(ActionKind::News))
            }
        }
    }
}

#[async_trait]
impl DataFetcher for HttpDataFetcher {
    async fn fetch(&self, action: ActionKind, prompt: &str) -> Result<String, DomainError> {
        match action {
            ActionKind::Weather => self.fetch_weather(prompt).await,
            ActionKind::Github => self.fetch_github().await,
            ActionKind::News => self.fetch_news().await,
        }
    }
}
