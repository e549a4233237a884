//! Shared test utilities for Tessera integration tests.
//!
//! Provides reusable helpers for building app state over temp-dir backed
//! stores and for reading axum response bodies.

#![allow(dead_code)]

use axum::body::Body;
use axum::Router;
use futures::StreamExt;
use serde_json::Value;
use std::sync::Arc;
use tessera::api::{create_router, AppState};
use tessera::config::HostConfig;
use tessera::layout::{LayoutItem, LayoutStore};
use tessera::registry::WidgetRegistry;
use tessera::secrets::SecretStore;

// =============================================================================
// Layout Builders
// =============================================================================

/// Layout item with default geometry and empty config.
pub fn make_item(instance_id: &str, widget_type_id: &str) -> LayoutItem {
    LayoutItem::new(instance_id, widget_type_id).at(0, 0, 2, 2)
}

/// Layout item carrying an instance config.
pub fn make_item_with_config(instance_id: &str, widget_type_id: &str, config: Value) -> LayoutItem {
    make_item(instance_id, widget_type_id).with_config(config)
}

// =============================================================================
// App Builders
// =============================================================================

/// App state over temp-dir backed stores with a plain secrets store attached.
///
/// Returns the TempDir so callers keep it alive for the test's duration.
pub fn make_state(config: HostConfig) -> (Arc<AppState>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();

    let mut config = config;
    config.storage.data_dir = dir.path().to_path_buf();

    let registry = Arc::new(WidgetRegistry::with_builtins());
    let layout = Arc::new(LayoutStore::open(&config.layout_path()).unwrap());
    let secrets = Arc::new(SecretStore::open_plain(&dir.path().join("secrets.json")).unwrap());

    let state = Arc::new(AppState::new(
        Arc::new(config),
        registry,
        layout,
        Some(secrets),
    ));
    (state, dir)
}

/// App state whose secret store failed to open; secrets endpoints serve 503.
pub fn make_state_without_secrets() -> (Arc<AppState>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();

    let mut config = HostConfig::default();
    config.storage.data_dir = dir.path().to_path_buf();

    let registry = Arc::new(WidgetRegistry::with_builtins());
    let layout = Arc::new(LayoutStore::open(&config.layout_path()).unwrap());

    let state = Arc::new(AppState::new(Arc::new(config), registry, layout, None));
    (state, dir)
}

/// Router plus the state behind it, for tests that poke both.
pub fn make_app() -> (Router, Arc<AppState>, tempfile::TempDir) {
    let (state, dir) = make_state(HostConfig::default());
    (create_router(Arc::clone(&state)), state, dir)
}

// =============================================================================
// Response Helpers
// =============================================================================

/// Collect an axum response body into a string.
pub async fn body_to_string(body: Body) -> String {
    let mut stream = body.into_data_stream();
    let mut result = String::new();
    while let Some(chunk) = stream.next().await {
        result.push_str(&String::from_utf8_lossy(&chunk.unwrap()));
    }
    result
}

/// Collect an axum response body and parse it as JSON.
pub async fn body_to_json(body: Body) -> Value {
    let text = body_to_string(body).await;
    serde_json::from_str(&text).unwrap()
}
