//! Chain execution contract and result shapes
//!
//! The serialized field names in [`StepRecord`] and [`ChainRunResult`]
//! are a wire contract; renaming them breaks existing consumers.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::entity::ChainStep;
use crate::domain::action::ActionKind;
use crate::domain::DomainError;

/// Outcome of a single step within a chain run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based position within the chain.
    pub step: usize,
    pub action: ActionKind,
    /// Effective generation prompt used for this step.
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub cached: bool,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub execution_time_ms: u64,
}

impl StepRecord {
    #[allow(clippy::too_many_arguments)]
    pub fn success(
        step: usize,
        action: ActionKind,
        prompt: String,
        ai_response: String,
        api_response: String,
        final_result: String,
        cached: bool,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            step,
            action,
            prompt,
            ai_response: Some(ai_response),
            api_response: Some(api_response),
            final_result: Some(final_result),
            error: None,
            cached,
            timestamp: chrono::Utc::now(),
            execution_time_ms,
        }
    }

    pub fn failure(
        step: usize,
        action: ActionKind,
        prompt: String,
        error: String,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            step,
            action,
            prompt,
            ai_response: None,
            api_response: None,
            final_result: None,
            error: Some(error),
            cached: false,
            timestamp: chrono::Utc::now(),
            execution_time_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Full result of a chain run, in wire shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainRunResult {
    /// Present for named and public runs; ad-hoc runs have no id.
    #[serde(rename = "chainId", default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    #[serde(rename = "chainName")]
    pub chain_name: String,
    #[serde(rename = "totalSteps")]
    pub total_steps: usize,
    #[serde(rename = "completedSteps")]
    pub completed_steps: usize,
    #[serde(rename = "failedSteps")]
    pub failed_steps: usize,
    pub results: Vec<StepRecord>,
    pub summary: String,
    #[serde(rename = "executedAt")]
    pub executed_at: chrono::DateTime<chrono::Utc>,
    #[serde(rename = "isPublic", default, skip_serializing_if = "is_false")]
    pub is_public: bool,
    #[serde(rename = "isAdHoc", default, skip_serializing_if = "is_false")]
    pub is_ad_hoc: bool,
}

fn is_false(v: &bool) -> bool {
    !v
}

impl ChainRunResult {
    /// Assembles the result from per-step records, deriving counters and
    /// the human-readable summary.
    pub fn from_steps(chain_name: impl Into<String>, results: Vec<StepRecord>) -> Self {
        let chain_name = chain_name.into();
        let completed = results.iter().filter(|r| r.is_success()).count();
        let failed = results.len() - completed;
        let summary = chain_summary(&chain_name, &results);
        Self {
            chain_id: None,
            chain_name,
            total_steps: results.len(),
            completed_steps: completed,
            failed_steps: failed,
            results,
            summary,
            executed_at: chrono::Utc::now(),
            is_public: false,
            is_ad_hoc: false,
        }
    }
}

/// Renders the human-readable execution summary.
pub fn chain_summary(chain_name: &str, results: &[StepRecord]) -> String {
    let completed = results.iter().filter(|r| r.is_success()).count();
    let mut summary = format!(
        "🔗 Workflow Chain \"{}\" Execution Summary:\n✅ Completed: {}/{} steps\n\n",
        chain_name,
        completed,
        results.len()
    );
    for record in results {
        if record.is_success() {
            summary.push_str(&format!(
                "✅ Step {}: {} - Success\n",
                record.step, record.action
            ));
        } else {
            summary.push_str(&format!(
                "❌ Step {}: {} - Failed ({})\n",
                record.step,
                record.action,
                record.error.as_deref().unwrap_or("unknown error")
            ));
        }
    }
    summary
}

/// Result of a standalone single-capability run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleRunResult {
    pub action: ActionKind,
    pub ai_response: String,
    pub api_response: String,
    pub final_result: String,
    pub cached: bool,
    pub execution_time_ms: u64,
}

/// Executes chains in their three entry modes plus single-capability runs.
#[async_trait]
pub trait ChainExecutor: Send + Sync {
    /// Runs a caller-supplied step list without persisting a definition.
    async fn execute_ad_hoc(
        &self,
        steps: &[ChainStep],
        prompt: &str,
        identity: Option<&str>,
        name: Option<&str>,
    ) -> Result<ChainRunResult, DomainError>;

    /// Runs a stored chain by id, enforcing ownership and bumping its
    /// execution counters.
    async fn execute_named(
        &self,
        chain_id: &str,
        prompt: &str,
        identity: Option<&str>,
    ) -> Result<ChainRunResult, DomainError>;

    /// Runs a catalog chain; no identity required, no counters touched.
    async fn execute_public(
        &self,
        public_id: &str,
        prompt: &str,
    ) -> Result<ChainRunResult, DomainError>;

    /// Runs one capability outside any chain.
    async fn run_single(
        &self,
        action: ActionKind,
        prompt: &str,
        identity: Option<&str>,
    ) -> Result<SingleRunResult, DomainError>;
}
