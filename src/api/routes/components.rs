//! Component ingestion and lookup endpoints

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::trace;

use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{ComponentsResponse, IngestResponse},
};
use crate::component::ComponentView;
use crate::store::{IngestOutcome, IngestRequest};

/// POST /api/v1/components
///
/// Create a component, or update the one with the same natural key.
/// Answers 201 on create and 200 on update.
pub async fn ingest(
    State(state): State<ApiState>,
    body: Result<Json<IngestRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<IngestResponse>)> {
    let Json(request) = body?;
    let (outcome, component) = state.store.ingest(request).await?;

    trace!("ingest {:?} component {}", outcome, component.id);

    let status = match outcome {
        IngestOutcome::Created => StatusCode::CREATED,
        IngestOutcome::Updated => StatusCode::OK,
    };
    Ok((status, Json(IngestResponse::new(outcome, component))))
}

/// GET /api/v1/components
pub async fn list_components(State(state): State<ApiState>) -> ApiResult<Json<ComponentsResponse>> {
    let components = state.store.list_all().await?;
    Ok(Json(ComponentsResponse {
        count: components.len(),
        components,
    }))
}

/// GET /api/v1/components/:id
pub async fn get_component(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<ComponentView>> {
    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("component {id} not found")))
}

/// DELETE /api/v1/components/:id
pub async fn delete_component(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if state.store.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("component {id} not found")))
    }
}
