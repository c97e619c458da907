//! Direct workflow run and history endpoints

use axum::{extract::Query, extract::State, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::error::ApiError;
use crate::api::identity::Identity;
use crate::api::state::AppState;
use crate::domain::action::ActionKind;
use crate::domain::chain::{RunRecord, SingleRunResult};

#[derive(Debug, Deserialize, Validate)]
pub struct RunWorkflowRequest {
    #[validate(length(min = 1, max = 500, message = "Prompt must be between 1-500 characters"))]
    pub prompt: String,
    pub action: ActionKind,
}

/// POST /api/run-workflow
pub async fn run_workflow(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<RunWorkflowRequest>,
) -> Result<Json<SingleRunResult>, ApiError> {
    request.validate()?;

    let result = state
        .executor
        .run_single(request.action, &request.prompt, identity.as_deref())
        .await?;

    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    50
}

/// Trimmed run record served by the history endpoint.
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub id: String,
    pub prompt: String,
    pub action: ActionKind,
    pub final_result: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<RunRecord> for HistoryEntry {
    fn from(run: RunRecord) -> Self {
        Self {
            id: run.id,
            prompt: run.prompt,
            action: run.action,
            final_result: run.final_result,
            created_at: run.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
}

/// GET /api/history
pub async fn history(
    State(state): State<AppState>,
    identity: Identity,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let limit = query.limit.clamp(1, 100);
    let runs = state.runs.recent(identity.as_deref(), limit).await?;
    Ok(Json(HistoryResponse {
        history: runs.into_iter().map(HistoryEntry::from).collect(),
    }))
}
