//! Handlers for the `/metrics` scrape endpoint and the `/v1/stats` JSON view.

use crate::api::AppState;
use crate::broadcast::BroadcastHub;
use crate::lifecycle::LifecycleManager;
use crate::metrics::types::{StatsResponse, WidgetTypeStats};
use crate::registry::WidgetRegistry;
use crate::secrets::SecretStore;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

/// `GET /metrics`, the Prometheus exposition text.
///
/// Scrapers always get a 200 with the exposition Content-Type, even before
/// any counter was touched.
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    // Gauges are derived, refresh them for this scrape
    state.metrics_collector.update_host_gauges();

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.metrics_collector.render_metrics(),
    )
}

/// `GET /v1/stats`, host statistics with a per-widget-type breakdown.
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let widgets = compute_widget_stats(
        &state.registry,
        &state.hub,
        &state.lifecycle,
        state.secrets.as_deref(),
    );

    Json(StatsResponse {
        uptime_seconds: state.metrics_collector.uptime_seconds(),
        widget_types: state.registry.len(),
        active_backends: state.lifecycle.active_count(),
        sse_subscribers: state.hub.subscriber_count(),
        widgets,
    })
}

/// Compute per-type statistics across registry, hub, and lifecycle state.
///
/// Secret values never appear here; only the existence flag does.
pub fn compute_widget_stats(
    registry: &WidgetRegistry,
    hub: &BroadcastHub,
    lifecycle: &LifecycleManager,
    secrets: Option<&SecretStore>,
) -> Vec<WidgetTypeStats> {
    let active = lifecycle.active_instances();

    registry
        .descriptors()
        .into_iter()
        .map(|desc| {
            let active_instances = active.iter().filter(|(_, ty)| ty == &desc.id).count();
            let error_instances = hub
                .snapshots_for_type(&desc.id)
                .iter()
                .filter(|snap| snap.health.is_error())
                .count();
            let secrets_configured = secrets.map(|s| s.has_secrets(&desc.id)).unwrap_or(false);

            WidgetTypeStats {
                id: desc.id,
                name: desc.name,
                active_instances,
                error_instances,
                secrets_configured,
            }
        })
        .collect()
}
