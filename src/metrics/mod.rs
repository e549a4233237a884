//! Host observability: Prometheus export plus a JSON stats view.
//!
//! Two endpoints read from here, `GET /metrics` for the Prometheus text
//! format and `GET /v1/stats` for JSON. Counters and histograms are
//! recorded at their call sites; the gauges are derived from live host
//! state right before each scrape.
//!
//! Recorded series:
//!
//! Counters
//! - `tessera_events_published_total` - Widget events fanned out
//! - `tessera_backend_starts_total{widget}` - Backend starts per widget type
//! - `tessera_backend_start_failures_total{widget}` - Failed initializer calls
//! - `tessera_backend_stops_total{widget}` - Backend stops per widget type
//! - `tessera_reconcile_runs_total` - Reconciliation passes
//! - `tessera_secrets_writes_total` / `tessera_secrets_deletes_total` - Secret mutations
//!
//! Histograms
//! - `tessera_reconcile_duration_seconds` - Reconciliation pass duration
//!
//! Gauges
//! - `tessera_active_backends` - Running backend instances
//! - `tessera_layout_items` - Items in the persisted layout
//! - `tessera_snapshots_total` - Instances holding a data snapshot
//! - `tessera_sse_subscribers` - Connected live viewers
//! - `tessera_widget_types` - Registered widget types

pub mod handler;
pub mod types;

pub use types::*;

pub use metrics_exporter_prometheus::PrometheusBuilder;
use metrics_exporter_prometheus::{Matcher, PrometheusHandle};

use crate::broadcast::BroadcastHub;
use crate::lifecycle::LifecycleManager;
use crate::registry::WidgetRegistry;
use std::sync::Arc;
use std::time::Instant;

/// Gauge computation and Prometheus rendering for the host.
pub struct MetricsCollector {
    /// Registered widget types, for the widget_types gauge
    registry: Arc<WidgetRegistry>,
    /// Event hub, for snapshot and subscriber gauges
    hub: Arc<BroadcastHub>,
    /// Lifecycle manager, for the active backend gauge
    lifecycle: Arc<LifecycleManager>,
    /// When the host came up, for the uptime field in stats
    start_time: Instant,
    /// Handle that renders the scrape output
    prometheus_handle: PrometheusHandle,
}

impl MetricsCollector {
    /// Bundle the live components whose state feeds the gauges.
    pub fn new(
        registry: Arc<WidgetRegistry>,
        hub: Arc<BroadcastHub>,
        lifecycle: Arc<LifecycleManager>,
        start_time: Instant,
        prometheus_handle: PrometheusHandle,
    ) -> Self {
        Self {
            registry,
            hub,
            lifecycle,
            start_time,
            prometheus_handle,
        }
    }

    /// Recompute the derived gauges from live host state.
    ///
    /// Called right before each scrape and stats request so the values
    /// cannot go stale between updates.
    pub fn update_host_gauges(&self) {
        metrics::gauge!("tessera_widget_types").set(self.registry.len() as f64);
        metrics::gauge!("tessera_active_backends").set(self.lifecycle.active_count() as f64);
        metrics::gauge!("tessera_snapshots_total").set(self.hub.snapshot_count() as f64);
        metrics::gauge!("tessera_sse_subscribers").set(self.hub.subscriber_count() as f64);
    }

    /// Seconds since the host started.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// The widget type registry behind the gauges.
    pub fn registry(&self) -> &Arc<WidgetRegistry> {
        &self.registry
    }

    /// The event hub behind the gauges.
    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }

    /// The lifecycle manager behind the gauges.
    pub fn lifecycle(&self) -> &Arc<LifecycleManager> {
        &self.lifecycle
    }

    /// Render the Prometheus exposition text.
    pub fn render_metrics(&self) -> String {
        self.prometheus_handle.render()
    }
}

/// Install the global Prometheus recorder and return its render handle.
///
/// Reconciliation is an in-process pass over the handle map, so its duration
/// buckets run from sub-millisecond to one second rather than the default
/// network-latency spread.
pub fn setup_metrics() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    let reconcile_buckets = &[
        0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
    ];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("tessera_reconcile_duration_seconds".to_string()),
            reconcile_buckets,
        )?
        .install_recorder()?;

    Ok(handle)
}
