//! Chain management and execution endpoints

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::error::ApiError;
use crate::api::identity::Identity;
use crate::api::state::AppState;
use crate::domain::chain::{Chain, ChainRunResult, ChainStep};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateChainRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "Description cannot exceed 500 characters"))]
    #[serde(default)]
    pub description: String,
    pub actions: Vec<ChainStep>,
}

#[derive(Debug, Serialize)]
pub struct CreateChainResponse {
    pub message: &'static str,
    pub chain: Chain,
}

/// POST /api/chains
pub async fn create_chain(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<CreateChainRequest>,
) -> Result<(axum::http::StatusCode, Json<CreateChainResponse>), ApiError> {
    request.validate()?;

    let Some(owner) = identity.as_deref() else {
        return Err(ApiError::forbidden("Authentication required to create chains"));
    };

    let chain = Chain::new(
        request.name,
        request.description,
        request.actions,
        Some(owner.to_string()),
    );
    chain.validate()?;

    state.chains.create(&chain).await?;

    Ok((
        axum::http::StatusCode::CREATED,
        Json(CreateChainResponse {
            message: "Workflow chain created successfully",
            chain,
        }),
    ))
}

/// GET /api/chains
///
/// Identified callers see their own chains; anonymous callers see the
/// shared catalog.
pub async fn list_chains(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<Chain>>, ApiError> {
    match identity.as_deref() {
        Some(owner) => Ok(Json(state.chains.list_for_owner(owner).await?)),
        None => Ok(Json(Chain::public_catalog())),
    }
}

/// GET /api/chains/{id}
pub async fn get_chain(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Json<Chain>, ApiError> {
    if Chain::is_public_id(&id) {
        return Chain::public_catalog()
            .into_iter()
            .find(|chain| chain.id == id)
            .map(Json)
            .ok_or_else(|| ApiError::not_found("Public workflow chain not found"));
    }

    let chain = state
        .chains
        .find_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Workflow chain not found"))?;

    if let Some(owner) = &chain.owner_id {
        if identity.as_deref() != Some(owner.as_str()) {
            return Err(ApiError::forbidden("Unauthorized access to workflow chain"));
        }
    }

    Ok(Json(chain))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ExecuteChainRequest {
    #[validate(length(min = 1, max = 500, message = "Prompt must be between 1-500 characters"))]
    pub prompt: String,
}

/// POST /api/chains/{id}/execute
pub async fn execute_chain(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    Json(request): Json<ExecuteChainRequest>,
) -> Result<Json<ChainRunResult>, ApiError> {
    request.validate()?;

    let result = if Chain::is_public_id(&id) {
        state.executor.execute_public(&id, &request.prompt).await?
    } else {
        state
            .executor
            .execute_named(&id, &request.prompt, identity.as_deref())
            .await?
    };

    Ok(Json(result))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RunChainRequest {
    #[validate(length(min = 1, max = 500, message = "Prompt must be between 1-500 characters"))]
    pub prompt: String,
    #[validate(length(min = 1, max = 10, message = "Actions must contain 1-10 items"))]
    pub actions: Vec<ChainStep>,
    #[validate(length(min = 1, max = 100, message = "Name must be between 1-100 characters"))]
    pub name: Option<String>,
}

/// POST /api/chains/run
pub async fn run_chain(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<RunChainRequest>,
) -> Result<Json<ChainRunResult>, ApiError> {
    request.validate()?;

    let result = state
        .executor
        .execute_ad_hoc(
            &request.actions,
            &request.prompt,
            identity.as_deref(),
            request.name.as_deref(),
        )
        .await?;

    Ok(Json(result))
}
