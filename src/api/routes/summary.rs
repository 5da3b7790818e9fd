//! Severity summary endpoints

use axum::{
    Json,
    extract::{Path, State},
};

use crate::api::{error::ApiResult, state::ApiState, types::SummaryResponse};
use crate::component::Scope;
use crate::summary::{ScopeSummary, SeverityCounts};

/// GET /api/v1/summary
///
/// Counts per effective severity for every system, broken down per project
pub async fn summary(State(state): State<ApiState>) -> ApiResult<Json<SummaryResponse>> {
    let systems = state.store.summary_all().await?;

    let mut totals = SeverityCounts::default();
    for system in &systems {
        totals.merge(&system.counts);
    }

    Ok(Json(SummaryResponse { systems, totals }))
}

/// GET /api/v1/scopes/:system/:project/summary
pub async fn scope_summary(
    State(state): State<ApiState>,
    Path((system, project)): Path<(String, String)>,
) -> ApiResult<Json<ScopeSummary>> {
    let scope = Scope::new(system, project);
    let counts = state.store.summary_scope(&scope).await?;

    Ok(Json(ScopeSummary {
        system_name: scope.system_name,
        project_name: scope.project_name,
        counts,
    }))
}
