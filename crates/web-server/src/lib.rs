//! # Web Server
//!
//! The HTTP surface of the heatmap service. Handlers are thin: they parse the
//! request, call `HeatmapService` and serialize the result. All statistics live in
//! the `analytics` crate.

use analytics::HeatmapService;
use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
pub struct AppState {
    pub service: Arc<HeatmapService>,
}

/// Builds the application routes over an already constructed service.
pub fn router(service: Arc<HeatmapService>) -> Router {
    let app_state = Arc::new(AppState { service });
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/", get(handlers::root))
        .route("/api/health", get(|| async { "OK" }))
        // Dashboard clients call the unprefixed paths.
        .route("/indices", get(handlers::get_indices))
        .route("/heatmap/:index_name", get(handlers::get_heatmap))
        .route("/api/indices", get(handlers::get_indices))
        .route("/api/heatmap/:index_name", get(handlers::get_heatmap))
        .with_state(app_state)
        .layer(cors)
        // Logs every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// Serves the API on `addr` until the process is stopped.
pub async fn run_server(addr: SocketAddr, service: Arc<HeatmapService>) -> anyhow::Result<()> {
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Web server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
