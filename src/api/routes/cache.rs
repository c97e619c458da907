//! Cache inspection endpoints, gated behind `debug_endpoints`

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::domain::cache::CacheStats;

fn ensure_enabled(state: &AppState) -> Result<(), ApiError> {
    if !state.debug_endpoints {
        return Err(ApiError::not_found("Not found"));
    }
    Ok(())
}

/// GET /api/cache/stats
pub async fn cache_stats(State(state): State<AppState>) -> Result<Json<CacheStats>, ApiError> {
    ensure_enabled(&state)?;
    Ok(Json(state.cache.stats().await))
}

#[derive(Debug, Serialize)]
pub struct CacheClearResponse {
    pub message: &'static str,
}

/// DELETE /api/cache/clear
pub async fn cache_clear(State(state): State<AppState>) -> Result<Json<CacheClearResponse>, ApiError> {
    ensure_enabled(&state)?;
    state.cache.clear().await;
    Ok(Json(CacheClearResponse {
        message: "Cache cleared",
    }))
}
