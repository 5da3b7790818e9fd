//! Health check endpoint

use axum::{Json, extract::State};

use crate::api::{error::ApiResult, state::ApiState, types::HealthResponse};

/// GET /api/v1/health
///
/// Reports `ok` when the storage backend is healthy, `degraded` otherwise
pub async fn health_check(State(state): State<ApiState>) -> ApiResult<Json<HealthResponse>> {
    let storage = state.store.health_check().await?;
    let status = if storage.healthy { "ok" } else { "degraded" };

    Ok(Json(HealthResponse {
        status: status.to_string(),
        timestamp: state.store.now().to_rfc3339(),
        storage,
    }))
}
