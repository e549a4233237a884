//! Widget backend lifecycle management.
//!
//! The lifecycle manager owns every running backend and reconciles that set
//! against the persisted layout: one backend per layout instance, started
//! through the registered factory, stopped when the instance disappears,
//! restarted when its config drifts. Reconciliation is deliberately
//! synchronous; factories spawn their own tasks and return immediately, so a
//! pass only ever does bookkeeping.

mod context;
mod error;
mod handle;

pub use context::{WidgetContext, WidgetLog};
pub use error::WidgetError;
pub use handle::{BackendHandle, ExportFn, InitOutcome};

pub(crate) use handle::ActiveBackend;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::Serialize;
use serde_json::{json, Value};

use crate::broadcast::BroadcastHub;
use crate::layout::LayoutItem;
use crate::registry::WidgetRegistry;
use crate::secrets::SecretStore;

/// Outcome of one reconciliation pass, per instance id.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileSummary {
    pub started: Vec<String>,
    pub restarted: Vec<String>,
    pub stopped: Vec<String>,
    /// Instances left without a backend: unregistered type or failed init
    pub skipped: Vec<String>,
    pub unchanged: usize,
}

impl ReconcileSummary {
    /// True when the pass changed nothing.
    pub fn is_noop(&self) -> bool {
        self.started.is_empty()
            && self.restarted.is_empty()
            && self.stopped.is_empty()
            && self.skipped.is_empty()
    }
}

enum Plan {
    Start,
    Restart,
    Keep,
}

/// Tracks running backends and drives them toward the desired layout.
pub struct LifecycleManager {
    registry: Arc<WidgetRegistry>,
    hub: Arc<BroadcastHub>,
    secrets: Option<Arc<SecretStore>>,
    /// instance id -> running backend; the map is the at-most-one guarantee
    handles: Mutex<HashMap<String, ActiveBackend>>,
}

impl LifecycleManager {
    pub fn new(
        registry: Arc<WidgetRegistry>,
        hub: Arc<BroadcastHub>,
        secrets: Option<Arc<SecretStore>>,
    ) -> Self {
        Self {
            registry,
            hub,
            secrets,
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Reconcile running backends against the given layout.
    ///
    /// Stops backends whose instance left the layout, starts backends for new
    /// instances, restarts backends whose instance config changed, and leaves
    /// the rest untouched. A factory failure is logged and skipped; the pass
    /// always completes.
    pub fn reconcile(&self, layout: &[LayoutItem]) -> ReconcileSummary {
        let started_at = Instant::now();
        let mut handles = self.handles.lock().unwrap();
        let mut summary = ReconcileSummary::default();

        // Desired set, keyed by instance. First occurrence wins if a stored
        // layout was tampered into carrying duplicates.
        let mut desired: HashMap<&str, &LayoutItem> = HashMap::new();
        for item in layout {
            if self.registry.get(&item.widget_type_id).is_none() {
                tracing::warn!(
                    instance = %item.instance_id,
                    widget = %item.widget_type_id,
                    "No factory registered for widget type, instance stays frontend-only"
                );
                summary.skipped.push(item.instance_id.clone());
                continue;
            }
            if desired.contains_key(item.instance_id.as_str()) {
                tracing::warn!(
                    instance = %item.instance_id,
                    "Duplicate instance id in layout, keeping first occurrence"
                );
                continue;
            }
            desired.insert(item.instance_id.as_str(), item);
        }

        // Stop backends whose instance is gone.
        let gone: Vec<String> = handles
            .keys()
            .filter(|id| !desired.contains_key(id.as_str()))
            .cloned()
            .collect();
        for instance_id in gone {
            if let Some(backend) = handles.remove(&instance_id) {
                self.stop_backend(&instance_id, &backend);
                summary.stopped.push(instance_id);
            }
        }

        // Start new backends, restart drifted ones.
        for (instance_id, item) in desired {
            let plan = match handles.get(instance_id) {
                None => Plan::Start,
                Some(active) if active.config == item.config => Plan::Keep,
                Some(_) => Plan::Restart,
            };
            match plan {
                Plan::Keep => summary.unchanged += 1,
                Plan::Start => {
                    match self.start_backend(instance_id, &item.widget_type_id, item.config.clone())
                    {
                        Some(active) => {
                            handles.insert(instance_id.to_string(), active);
                            summary.started.push(instance_id.to_string());
                        }
                        None => summary.skipped.push(instance_id.to_string()),
                    }
                }
                Plan::Restart => {
                    if let Some(backend) = handles.remove(instance_id) {
                        self.stop_backend(instance_id, &backend);
                    }
                    match self.start_backend(instance_id, &item.widget_type_id, item.config.clone())
                    {
                        Some(active) => {
                            handles.insert(instance_id.to_string(), active);
                            summary.restarted.push(instance_id.to_string());
                        }
                        None => summary.skipped.push(instance_id.to_string()),
                    }
                }
            }
        }

        summary.started.sort();
        summary.restarted.sort();
        summary.stopped.sort();
        summary.skipped.sort();

        metrics::counter!("tessera_reconcile_runs_total").increment(1);
        metrics::histogram!("tessera_reconcile_duration_seconds")
            .record(started_at.elapsed().as_secs_f64());
        metrics::gauge!("tessera_active_backends").set(handles.len() as f64);

        if summary.is_noop() {
            tracing::debug!(unchanged = summary.unchanged, "Reconciliation pass was a no-op");
        } else {
            tracing::info!(
                started = summary.started.len(),
                restarted = summary.restarted.len(),
                stopped = summary.stopped.len(),
                skipped = summary.skipped.len(),
                unchanged = summary.unchanged,
                "Reconciliation pass complete"
            );
        }

        summary
    }

    /// Stop and restart every running backend of one widget type with its
    /// current config. Used after a secrets write so backends pick up the new
    /// values. Returns the number of instances restarted.
    pub fn restart_type(&self, widget_type_id: &str) -> usize {
        let mut handles = self.handles.lock().unwrap();

        let targets: Vec<(String, Value)> = handles
            .iter()
            .filter(|(_, backend)| backend.widget_type_id == widget_type_id)
            .map(|(id, backend)| (id.clone(), backend.config.clone()))
            .collect();

        let mut restarted = 0;
        for (instance_id, config) in targets {
            if let Some(backend) = handles.remove(&instance_id) {
                self.stop_backend(&instance_id, &backend);
            }
            if let Some(active) = self.start_backend(&instance_id, widget_type_id, config) {
                handles.insert(instance_id, active);
                restarted += 1;
            }
        }

        metrics::gauge!("tessera_active_backends").set(handles.len() as f64);
        restarted
    }

    /// Kick the refresh hook of every backend that has one. Returns how many
    /// were kicked.
    pub fn refresh_all(&self) -> usize {
        let handles = self.handles.lock().unwrap();
        handles.values().filter(|backend| backend.refresh()).count()
    }

    /// Kick the refresh hooks of one widget type.
    pub fn refresh_type(&self, widget_type_id: &str) -> usize {
        let handles = self.handles.lock().unwrap();
        handles
            .values()
            .filter(|backend| backend.widget_type_id == widget_type_id)
            .filter(|backend| backend.refresh())
            .count()
    }

    /// Dump one backend's state through its export hook.
    ///
    /// `None` when the instance has no running backend or the backend exposes
    /// no export.
    pub fn export(&self, instance_id: &str) -> Option<Value> {
        let handles = self.handles.lock().unwrap();
        handles.get(instance_id).and_then(|backend| backend.export())
    }

    /// Whether a backend is currently tracked for this instance.
    pub fn has_instance(&self, instance_id: &str) -> bool {
        self.handles.lock().unwrap().contains_key(instance_id)
    }

    pub fn active_count(&self) -> usize {
        self.handles.lock().unwrap().len()
    }

    /// Sorted `(instance id, widget type id)` pairs for every tracked backend.
    pub fn active_instances(&self) -> Vec<(String, String)> {
        let handles = self.handles.lock().unwrap();
        let mut active: Vec<(String, String)> = handles
            .iter()
            .map(|(id, backend)| (id.clone(), backend.widget_type_id.clone()))
            .collect();
        active.sort();
        active
    }

    /// Stop every backend. Called on shutdown; idempotent.
    pub fn stop_all(&self) {
        let mut handles = self.handles.lock().unwrap();
        if handles.is_empty() {
            return;
        }
        let count = handles.len();
        for (instance_id, backend) in handles.drain() {
            self.stop_backend(&instance_id, &backend);
        }
        metrics::gauge!("tessera_active_backends").set(0.0);
        tracing::info!(count, "All widget backends stopped");
    }

    fn start_backend(
        &self,
        instance_id: &str,
        widget_type_id: &str,
        config: Value,
    ) -> Option<ActiveBackend> {
        let factory = self.registry.get(widget_type_id)?;
        let secrets = self
            .secrets
            .as_ref()
            .map(|store| store.bucket(widget_type_id))
            .unwrap_or_else(|| json!({}));

        // Register before init so a backend's very first publish already
        // lands in the snapshot table.
        self.hub.register_instance(instance_id, widget_type_id);

        let ctx = WidgetContext::new(
            instance_id.to_string(),
            widget_type_id.to_string(),
            config.clone(),
            secrets,
            Arc::clone(&self.hub),
        );

        match factory.init(ctx) {
            Ok(outcome) => {
                metrics::counter!("tessera_backend_starts_total", "widget" => widget_type_id.to_string())
                    .increment(1);
                tracing::info!(
                    instance = %instance_id,
                    widget = %widget_type_id,
                    "Widget backend started"
                );
                Some(ActiveBackend::from_outcome(
                    widget_type_id.to_string(),
                    config,
                    outcome,
                ))
            }
            Err(e) => {
                self.hub.deregister_instance(instance_id);
                metrics::counter!("tessera_backend_start_failures_total", "widget" => widget_type_id.to_string())
                    .increment(1);
                tracing::error!(
                    instance = %instance_id,
                    widget = %widget_type_id,
                    error = %e,
                    "Widget backend failed to start"
                );
                None
            }
        }
    }

    fn stop_backend(&self, instance_id: &str, backend: &ActiveBackend) {
        backend.stop();
        self.hub.deregister_instance(instance_id);
        metrics::counter!("tessera_backend_stops_total", "widget" => backend.widget_type_id.clone())
            .increment(1);
        tracing::info!(
            instance = %instance_id,
            widget = %backend.widget_type_id,
            "Widget backend stopped"
        );
    }
}
