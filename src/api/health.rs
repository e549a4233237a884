//! Liveness endpoint.

use crate::api::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub widget_types: usize,
    pub active_backends: usize,
    pub layout_items: usize,
    pub sse_subscribers: usize,
}

/// GET /health - Return host health status.
///
/// The host is "ok" as long as it can serve requests; widget-level health
/// lives in the dashboard summary, not here.
pub async fn handle(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        widget_types: state.registry.len(),
        active_backends: state.lifecycle.active_count(),
        layout_items: state.layout.len(),
        sse_subscribers: state.hub.subscriber_count(),
    })
}
