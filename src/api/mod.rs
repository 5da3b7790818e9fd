//! REST API and WebSocket server for the component store
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **ComponentStore** handle shared by every handler
//! - **WebSocket** for change notifications
//!
//! ## Endpoints
//!
//! - `POST /api/v1/components` - Ingest a status report (alias: `POST /api/components`)
//! - `GET /api/v1/components` - All components
//! - `GET|DELETE /api/v1/components/:id` - One component
//! - `GET /api/v1/scopes` - Systems and their projects
//! - `GET /api/v1/scopes/:system/:project/components` - Paged query
//! - `GET /api/v1/scopes/:system/:project/components/window` - Windowed query
//! - `GET /api/v1/scopes/:system/:project/headers` - Column headers
//! - `GET /api/v1/scopes/:system/:project/summary` - Severity counts for a scope
//! - `DELETE /api/v1/scopes/:system/:project` - Delete a scope
//! - `GET /api/v1/summary` - Severity counts per system and project
//! - `GET /api/v1/health` - Health check
//! - `GET /api/v1/stats` - Storage and retention statistics
//! - `WS /api/v1/stream` - Change notifications

#[cfg(feature = "api")]
pub mod error;
#[cfg(feature = "api")]
pub mod routes;
#[cfg(feature = "api")]
pub mod state;
#[cfg(feature = "api")]
pub mod types;
#[cfg(feature = "api")]
pub mod websocket;

#[cfg(feature = "api")]
pub use error::{ApiError, ApiResult};
#[cfg(feature = "api")]
pub use state::ApiState;

#[cfg(feature = "api")]
use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::time::Duration;
#[cfg(feature = "api")]
use tracing::info;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:5000")
    pub bind_addr: SocketAddr,

    /// Enable permissive CORS for browser dashboards
    pub enable_cors: bool,

    /// Requests running longer than this are aborted with 408
    pub request_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            enable_cors: true,
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Build the router with every route and middleware layer
#[cfg(feature = "api")]
pub fn router(config: &ApiConfig, state: ApiState) -> Router {
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::timeout::TimeoutLayer;
    use tower_http::trace::TraceLayer;

    let mut app = Router::new()
        .route(
            "/api/v1/components",
            post(routes::components::ingest).get(routes::components::list_components),
        )
        .route("/api/components", post(routes::components::ingest))
        .route(
            "/api/v1/components/:id",
            get(routes::components::get_component).delete(routes::components::delete_component),
        )
        .route("/api/v1/scopes", get(routes::scopes::list_scopes))
        .route(
            "/api/v1/scopes/:system/:project",
            axum::routing::delete(routes::scopes::delete_scope),
        )
        .route(
            "/api/v1/scopes/:system/:project/components",
            get(routes::scopes::query_page),
        )
        .route(
            "/api/v1/scopes/:system/:project/components/window",
            get(routes::scopes::query_window),
        )
        .route(
            "/api/v1/scopes/:system/:project/headers",
            get(routes::scopes::get_headers),
        )
        .route(
            "/api/v1/scopes/:system/:project/summary",
            get(routes::summary::scope_summary),
        )
        .route("/api/v1/summary", get(routes::summary::summary))
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/stats", get(routes::stats::get_stats))
        .route("/api/v1/stream", get(websocket::websocket_handler))
        .with_state(state)
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http());

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
#[cfg(feature = "api")]
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    info!("starting API server on {}", config.bind_addr);

    let app = router(&config, state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
