//! Cache maintenance: `GET /api/cache/stats` and `POST /api/cache/clear`.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::error::ApiError;
use crate::handler::AppState;

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub audits: u64,
    pub fresh: u64,
    /// False when the server is running without a cache.
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub success: bool,
    pub removed: u64,
}

pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let Some(store) = state.engine.store() else {
        return Ok(Json(StatsResponse { audits: 0, fresh: 0, enabled: false }));
    };

    let stats = store.stats().await?;
    Ok(Json(StatsResponse { audits: stats.audits, fresh: stats.fresh, enabled: true }))
}

/// Delete expired entries. Fresh entries are left alone.
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>, ApiError> {
    let Some(store) = state.engine.store() else {
        return Ok(Json(ClearResponse { success: false, removed: 0 }));
    };

    let removed = store.sweep().await?;
    tracing::info!(removed, "swept expired cache entries");
    Ok(Json(ClearResponse { success: true, removed }))
}
