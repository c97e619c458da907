//! Repositories for stored chains and run history

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entity::Chain;
use crate::domain::action::ActionKind;
use crate::domain::DomainError;

/// Persistence for user-defined chains.
///
/// The shared catalog is not stored here; lookups for `public-*` ids are
/// resolved by the executor before reaching a repository.
#[async_trait]
pub trait ChainRepository: Send + Sync + Debug {
    async fn create(&self, chain: &Chain) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Chain>, DomainError>;

    /// Chains owned by the given identity, newest first.
    async fn list_for_owner(&self, owner_id: &str) -> Result<Vec<Chain>, DomainError>;

    /// Bumps the execution counter and stamps the last-executed time.
    async fn increment_execution_stats(&self, id: &str) -> Result<(), DomainError>;
}

/// One completed step, kept for the history endpoint.
///
/// Every successful step of every entry mode produces one record; failed
/// steps are not recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub id: String,
    /// Effective generation prompt used for the step.
    pub prompt: String,
    pub action: ActionKind,
    pub ai_response: String,
    pub api_response: String,
    pub final_result: String,
    /// Owner identity, `None` for anonymous runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl RunRecord {
    pub fn new(
        prompt: impl Into<String>,
        action: ActionKind,
        ai_response: impl Into<String>,
        api_response: impl Into<String>,
        final_result: impl Into<String>,
        owner_id: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            prompt: prompt.into(),
            action,
            ai_response: ai_response.into(),
            api_response: api_response.into(),
            final_result: final_result.into(),
            owner_id,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Persistence for execution history.
#[async_trait]
pub trait RunRecordRepository: Send + Sync + Debug {
    async fn record(&self, run: &RunRecord) -> Result<(), DomainError>;

    /// Most recent records, newest first, capped at `limit`.
    ///
    /// An identified caller sees only their own records; an anonymous
    /// caller sees everything recent.
    async fn recent(&self, owner_id: Option<&str>, limit: usize)
        -> Result<Vec<RunRecord>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_record_serde_shape() {
        let run = RunRecord::new(
            "plan my day",
            ActionKind::Weather,
            "Great day ahead!",
            "Sunny, 25°C",
            "Great day ahead! Sunny, 25°C #weather",
            None,
        );
        let json = serde_json::to_value(&run).unwrap();
        assert_eq!(json["prompt"], "plan my day");
        assert_eq!(json["action"], "weather");
        assert_eq!(json["final_result"], "Great day ahead! Sunny, 25°C #weather");
        assert!(json.get("created_at").is_some());
        assert!(json.get("owner_id").is_none());
    }
}
