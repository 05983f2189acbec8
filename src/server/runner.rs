//! Server execution logic.

use std::{path::PathBuf, sync::Arc};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::common::time::SystemClock;

use super::{
    handler::{aggregate, download_plugin, health_check, status_page, update},
    signal::shutdown_signal,
    state::AppState,
};

/// Update bodies larger than this are rejected by the transport layer.
const MAX_UPDATE_BODY_BYTES: usize = 64 * 1024;

/// Build the relay router over the given state.
///
/// Split out of [`run_server`] so tests can drive the router in-process.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/update", post(update))
        .route("/aggregate", get(aggregate))
        .route("/health", get(health_check))
        .route("/download/arcdps_cooldowns.dll", get(download_plugin))
        .route("/", get(status_page))
        .layer(DefaultBodyLimit::max(MAX_UPDATE_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run the relay server.
///
/// # Arguments
///
/// * `host` - The host address to bind to (e.g., "127.0.0.1")
/// * `port` - The port number to bind to (e.g., 3456)
/// * `asset_dir` - Directory holding the downloadable plugin binary
pub async fn run_server(
    host: String,
    port: u16,
    asset_dir: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::new(Arc::new(SystemClock), asset_dir));
    let app = build_router(state);

    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("relay listening on http://{}", listener.local_addr()?);
    tracing::info!("Press Ctrl+C to shutdown gracefully");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
