//! Provider domain - traits for external data and text generation

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::action::ActionKind;
use crate::domain::DomainError;

/// Fetches the external payload backing a capability.
///
/// Implementations talk to third-party HTTP APIs and must return a
/// human-readable summary string, never raw provider JSON.
#[async_trait]
pub trait DataFetcher: Send + Sync + Debug {
    /// Fetches fresh data for the given capability.
    ///
    /// The prompt is passed along so implementations can derive query
    /// parameters (city names, topics) from it.
    async fn fetch(&self, action: ActionKind, prompt: &str) -> Result<String, DomainError>;
}

/// Generates text from a prompt via an LLM backend.
#[async_trait]
pub trait TextGenerator: Send + Sync + Debug {
    async fn generate(&self, prompt: &str) -> Result<String, DomainError>;
}
