//! Gemini text-generation provider
//!
//! Self-throttling: requests are paced by a [`RateLimiter`], a 429 from
//! the backend opens a cooldown window, and while cooled down (or
//! keyless, or on auth/quota errors) the provider answers with a canned
//! fallback string instead of erroring. Transport failures are real
//! errors; callers see a string or one typed error, never a degraded
//! half-state they must interpret.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::provider::TextGenerator;
use crate::domain::DomainError;

use super::rate_limit::{RateLimiter, RateLimiterConfig, Throttle};

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

const FALLBACK_WEATHER: &[&str] = &[
    "What a wonderful day to enjoy the outdoors! The weather conditions look perfect for any activities you have planned.",
    "The weather forecast suggests it's a great time to step outside and make the most of the beautiful conditions.",
    "Perfect weather conditions ahead! This would be an ideal time for outdoor activities or just enjoying the fresh air.",
];

const FALLBACK_NEWS: &[&str] = &[
    "The latest developments in technology continue to shape our world in fascinating ways. Stay tuned for more exciting innovations!",
    "Breaking news in the tech world shows remarkable progress in AI and automation. These advancements are truly revolutionary!",
    "Current events highlight the rapid evolution of technology and its impact across various industries. Exciting times ahead!",
];

const FALLBACK_GITHUB: &[&str] = &[
    "The open-source community continues to amaze with incredible projects and collaborative development. Great things happening on GitHub!",
    "Amazing repositories are trending with innovative solutions and cutting-edge technologies. The developer community is thriving!",
    "GitHub showcases the best of collaborative coding with repositories that push the boundaries of what's possible.",
];

const FALLBACK_GENERIC: &[&str] = &[
    "This is a fascinating topic that opens up many interesting possibilities for discussion and exploration.",
    "What an intriguing subject! There are so many angles to consider and valuable insights to be gained.",
    "This presents an excellent opportunity to dive deeper and uncover the many layers of this complex topic.",
    "Great point! This deserves thoughtful analysis and there's definitely more to explore here.",
];

/// Configuration for the Gemini provider
#[derive(Debug, Clone)]
pub struct GeminiGeneratorConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub request_timeout: Duration,
    pub rate_limit: RateLimiterConfig,
}

impl Default for GeminiGeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(15),
            rate_limit: RateLimiterConfig::default(),
        }
    }
}

/// Text generator backed by the Gemini generateContent API.
#[derive(Debug)]
pub struct GeminiGenerator {
    client: reqwest::Client,
    config: GeminiGeneratorConfig,
    limiter: RateLimiter,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiGenerator {
    pub fn new(config: GeminiGeneratorConfig) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                DomainError::configuration(format!("Failed to build HTTP client: {}", e))
            })?;

        let limiter = RateLimiter::new(config.rate_limit.clone());

        Ok(Self {
            client,
            config,
            limiter,
        })
    }

    fn generate_url(&self, key: &str) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.base_url, self.config.model, key
        )
    }

    /// Canned response keyed off the prompt's subject matter.
    ///
    /// The generic pool is indexed by a prompt hash so identical prompts
    /// get identical fallbacks.
    pub fn fallback_response(prompt: &str) -> String {
        let lower = prompt.to_lowercase();

        let pool = if lower.contains("weather") {
            FALLBACK_WEATHER
        } else if lower.contains("news") || lower.contains("ai") || lower.contains("technology") {
            FALLBACK_NEWS
        } else if lower.contains("github") || lower.contains("repository") || lower.contains("code")
        {
            FALLBACK_GITHUB
        } else {
            let hash: usize = prompt.bytes().map(usize::from).sum();
            return FALLBACK_GENERIC[hash % FALLBACK_GENERIC.len()].to_string();
        };

        pool.choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(pool[0])
            .to_string()
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, DomainError> {
        let Some(key) = &self.config.api_key else {
            warn!("no Gemini API key configured, serving fallback response");
            return Ok(Self::fallback_response(prompt));
        };

        match self.limiter.begin_request() {
            Throttle::Proceed => {}
            Throttle::Delay(wait) => {
                debug!(wait_ms = wait.as_millis() as u64, "pacing Gemini request");
                tokio::time::sleep(wait).await;
            }
            Throttle::Cooldown => {
                warn!("Gemini rate-limit cooldown active, serving fallback response");
                return Ok(Self::fallback_response(prompt));
            }
        }

        let body = serde_json::json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {
                "maxOutputTokens": 300,
                "temperature": 0.8,
                "topP": 0.95,
                "topK": 40
            }
        });

        let response = self
            .client
            .post(self.generate_url(key))
            .json(&body)
            .send()
            .await
            .map_err(|e| DomainError::provider("gemini", e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Gemini answered 429, entering cooldown");
            self.limiter.note_rate_limited();
            return Ok(Self::fallback_response(prompt));
        }
        if !status.is_success() {
            warn!(status = %status, "Gemini API error, serving fallback response");
            return Ok(Self::fallback_response(prompt));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| DomainError::provider("gemini", format!("Failed to parse response: {}", e)))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            warn!("empty Gemini response, serving fallback response");
            return Ok(Self::fallback_response(prompt));
        }

        Ok(text)
    }
}
