//! Scope navigation and query endpoints

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::api::{
    error::ApiResult,
    state::ApiState,
    types::{
        DeleteScopeResponse, HeadersResponse, PageParams, PageResponse, ScopesResponse,
        WindowParams, WindowResponse,
    },
};
use crate::component::Scope;
use crate::query::Window;

/// GET /api/v1/scopes
///
/// Systems and the projects under each, for navigation
pub async fn list_scopes(State(state): State<ApiState>) -> ApiResult<Json<ScopesResponse>> {
    let scopes = state.store.scopes().await?;
    Ok(Json(ScopesResponse::from_scopes(scopes)))
}

/// GET /api/v1/scopes/:system/:project/components
///
/// Filtered, sorted, page-numbered query
pub async fn query_page(
    State(state): State<ApiState>,
    Path((system, project)): Path<(String, String)>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<PageResponse>> {
    let (filter, page, page_size) = params.split();
    let page_size = page_size.min(state.store.settings().max_page_size);
    let query = filter.into_query(Window::Page { page, page_size })?;

    let result = state
        .store
        .query(&Scope::new(system, project), query)
        .await?;

    Ok(Json(PageResponse {
        items: result.items,
        total: result.total,
        page,
        page_size,
    }))
}

/// GET /api/v1/scopes/:system/:project/components/window
///
/// Filtered, sorted, index-windowed query for virtualized lists
pub async fn query_window(
    State(state): State<ApiState>,
    Path((system, project)): Path<(String, String)>,
    Query(params): Query<WindowParams>,
) -> ApiResult<Json<WindowResponse>> {
    let (filter, start_index, count) = params.split();
    let count = count.min(state.store.settings().max_page_size);
    let query = filter.into_query(Window::Range { start_index, count })?;

    let result = state
        .store
        .query(&Scope::new(system, project), query)
        .await?;

    Ok(Json(WindowResponse {
        items: result.items,
        total: result.total,
        start_index,
        count,
    }))
}

/// GET /api/v1/scopes/:system/:project/headers
pub async fn get_headers(
    State(state): State<ApiState>,
    Path((system, project)): Path<(String, String)>,
) -> ApiResult<Json<HeadersResponse>> {
    let headers = state.store.headers(&Scope::new(system, project)).await?;
    Ok(Json(HeadersResponse { headers }))
}

/// DELETE /api/v1/scopes/:system/:project
pub async fn delete_scope(
    State(state): State<ApiState>,
    Path((system, project)): Path<(String, String)>,
) -> ApiResult<Json<DeleteScopeResponse>> {
    let deleted = state
        .store
        .delete_scope(&Scope::new(system, project))
        .await?;
    Ok(Json(DeleteScopeResponse { deleted }))
}
