//! Request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    common::time::server_time_label,
    domain::{DEFAULT_ROOM, UpdatePayload},
    view::StatusReport,
};

use super::{state::AppState, status::render_status_page};

/// File name of the plugin binary served by the download route.
pub const PLUGIN_ASSET: &str = "arcdps_cooldowns.dll";

/// Query parameters for `GET /aggregate`
#[derive(Debug, Deserialize)]
pub struct AggregateQuery {
    pub room: Option<String>,
}

/// `POST /update`: store a client's latest state.
///
/// The body is taken as raw JSON because ingestion is permissive: only a
/// missing client id or a non-sequence `entries` rejects the request, every
/// other malformed field coerces to its default.
pub async fn update(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    let payload = match UpdatePayload::from_value(&body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::warn!("Rejected update: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "ok": false, "err": "bad payload" })),
            );
        }
    };

    let now = state.clock.now_millis();
    let room = payload.room.clone();
    let client_id = payload.client_id.clone();

    let assigned_name = {
        let mut registry = state.registry.lock().await;
        registry.upsert(payload, now)
    };

    tracing::debug!(
        "Stored update from '{}' in room '{}' as '{}'",
        client_id,
        room,
        assigned_name
    );

    (
        StatusCode::OK,
        Json(json!({ "ok": true, "assignedName": assigned_name })),
    )
}

/// `GET /aggregate?room=<name>`: consolidated snapshot of one room.
///
/// Always 200; an unknown room yields an empty peer list.
pub async fn aggregate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AggregateQuery>,
) -> impl IntoResponse {
    let room = query
        .room
        .as_deref()
        .filter(|r| !r.is_empty())
        .unwrap_or(DEFAULT_ROOM);
    let now = state.clock.now_millis();

    let snapshot = {
        let mut registry = state.registry.lock().await;
        registry.snapshot(room, now)
    };

    Json(snapshot)
}

/// `GET /health`: liveness probe, does not touch the registry.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// `GET /download/arcdps_cooldowns.dll`: stream the plugin binary.
pub async fn download_plugin(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, StatusCode> {
    let path = state.asset_dir.join(PLUGIN_ASSET);
    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        tracing::error!("Error sending {}: {}", PLUGIN_ASSET, e);
        StatusCode::NOT_FOUND
    })?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{PLUGIN_ASSET}\""),
            ),
        ],
        bytes,
    ))
}

/// `GET /`: human-readable status page, diagnostic only.
pub async fn status_page(State(state): State<Arc<AppState>>) -> Html<String> {
    let now = state.clock.now_millis();

    let report = {
        let mut registry = state.registry.lock().await;
        registry.prune(now);
        // the default room always shows, even before its first client
        registry.ensure_room(DEFAULT_ROOM);
        StatusReport::build(registry.rooms(), now)
    };

    Html(render_status_page(&report, &server_time_label()))
}
