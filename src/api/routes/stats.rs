//! System statistics endpoint

use axum::{Json, extract::State};

use crate::api::{error::ApiResult, state::ApiState, types::StatsResponse};

/// GET /api/v1/stats
///
/// Returns storage statistics and retention sweep counters
pub async fn get_stats(State(state): State<ApiState>) -> ApiResult<Json<StatsResponse>> {
    let storage = state.store.backend_stats().await?;
    let scopes = state.store.scopes().await?.len();
    let retention = state.retention.get_stats().await;

    Ok(Json(StatsResponse {
        timestamp: state.store.now().to_rfc3339(),
        storage,
        scopes,
        retention,
    }))
}
