//! # Admin and Dashboard API
//!
//! HTTP surface of the Tessera widget host.
//!
//! This module implements the HTTP server that manages the dashboard layout,
//! widget secrets, and the live event stream, plus the aggregated read
//! endpoints the dashboard front end consumes.
//!
//! ## Endpoints
//!
//! - `GET /widgets` - Registered widget type descriptors
//! - `GET/POST /layout` - Read and replace the persisted grid layout
//! - `GET /secrets` - Widget types with stored secrets (ids only)
//! - `GET/POST/DELETE /widgets/{id}/secrets` - Per-type secret management
//! - `GET /events` - Server-sent event stream of widget data
//! - `GET /dashboard/*` - Aggregated snapshot, summary, and detail reads
//! - `GET /health` - Host health status
//! - `GET /metrics`, `GET /v1/stats` - Observability
//! - `GET /`, `GET /static/*` - Embedded dashboard assets
//!
//! ## Example
//!
//! ```no_run
//! use tessera::api::{AppState, create_router};
//! use tessera::config::HostConfig;
//! use tessera::layout::LayoutStore;
//! use tessera::registry::WidgetRegistry;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Load configuration and open the layout store
//! let config = Arc::new(HostConfig::default());
//! let registry = Arc::new(WidgetRegistry::with_builtins());
//! let layout = Arc::new(LayoutStore::open(&config.layout_path())?);
//!
//! // State without a secret store; secrets endpoints answer 503
//! let state = Arc::new(AppState::new(config, registry, layout, None));
//!
//! // Wire the route table and serve
//! let app = create_router(Arc::clone(&state));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every failing endpoint answers with the same envelope:
//! ```json
//! {
//!   "error": {
//!     "message": "Widget type 'weather-widget' not found",
//!     "type": "invalid_request_error",
//!     "code": "not_found"
//!   }
//! }
//! ```

mod assets;
mod dashboard;
pub mod error;
mod events;
mod health;
mod layout;
mod secrets;
mod widgets;

pub use error::{ApiError, ApiErrorBody};

use crate::broadcast::BroadcastHub;
use crate::config::HostConfig;
use crate::layout::LayoutStore;
use crate::lifecycle::LifecycleManager;
use crate::metrics::MetricsCollector;
use crate::registry::WidgetRegistry;
use crate::secrets::SecretStore;
use axum::{routing::get, Router};
use std::sync::Arc;
use std::time::Instant;
use tower_http::limit::RequestBodyLimitLayer;

/// Request bodies above this size are rejected outright (10 MB).
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Everything the handlers share, injected through axum `State`.
pub struct AppState {
    pub config: Arc<HostConfig>,
    pub registry: Arc<WidgetRegistry>,
    pub hub: Arc<BroadcastHub>,
    pub layout: Arc<LayoutStore>,
    /// Absent when the store failed to open; secrets endpoints return 503
    pub secrets: Option<Arc<SecretStore>>,
    pub lifecycle: Arc<LifecycleManager>,
    /// When this state was built, reported as uptime
    pub start_time: Instant,
    /// Gauge recomputation and scrape rendering
    pub metrics_collector: Arc<MetricsCollector>,
}

impl AppState {
    /// Create new application state from the loaded configuration and stores.
    ///
    /// The broadcast hub and lifecycle manager are constructed here so every
    /// handler shares the same instances.
    pub fn new(
        config: Arc<HostConfig>,
        registry: Arc<WidgetRegistry>,
        layout: Arc<LayoutStore>,
        secrets: Option<Arc<SecretStore>>,
    ) -> Self {
        let start_time = Instant::now();

        let hub = Arc::new(BroadcastHub::new(config.broadcast.capacity));

        let lifecycle = Arc::new(LifecycleManager::new(
            Arc::clone(&registry),
            Arc::clone(&hub),
            secrets.clone(),
        ));

        // The process-wide recorder can only be installed once. When a
        // second AppState is built (tests spin up many) fall back to a
        // detached recorder so construction still succeeds.
        let prometheus_handle = crate::metrics::setup_metrics().unwrap_or_else(|e| {
            tracing::debug!("Recorder already installed, using a detached handle: {}", e);
            crate::metrics::PrometheusBuilder::new()
                .build_recorder()
                .handle()
        });

        let metrics_collector = Arc::new(MetricsCollector::new(
            Arc::clone(&registry),
            Arc::clone(&hub),
            Arc::clone(&lifecycle),
            start_time,
            prometheus_handle,
        ));

        Self {
            config,
            registry,
            hub,
            layout,
            secrets,
            lifecycle,
            start_time,
            metrics_collector,
        }
    }
}

/// Build the full route table for the host.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(assets::index_handler))
        .route("/static/*path", get(assets::asset_handler))
        .route("/widgets", get(widgets::list_handler))
        .route(
            "/widgets/:widget_type_id/secrets",
            get(secrets::get_handler)
                .post(secrets::store_handler)
                .delete(secrets::delete_handler),
        )
        .route("/secrets", get(secrets::list_handler))
        .route(
            "/layout",
            get(layout::get_handler).post(layout::save_handler),
        )
        .route("/events", get(events::sse_handler))
        .route("/dashboard/snapshot", get(dashboard::snapshot_handler))
        .route("/dashboard/ai-summary", get(dashboard::ai_summary_handler))
        .route(
            "/dashboard/widget/:instance_id",
            get(dashboard::widget_handler),
        )
        .route(
            "/dashboard/widget-type/:widget_type_id",
            get(dashboard::widget_type_handler),
        )
        .route("/health", get(health::handle))
        .route("/metrics", get(crate::metrics::handler::metrics_handler))
        .route("/v1/stats", get(crate::metrics::handler::stats_handler))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .with_state(state)
}
