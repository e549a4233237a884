//! Handles to running widget backends.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Closure a backend may expose to dump its internal state on demand.
///
/// Must be cheap and non-blocking; called from API handlers.
pub type ExportFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// What a factory hands back after starting (or declining to start) a
/// backend for one widget instance.
pub enum InitOutcome {
    /// Backend runs in its own tasks; cancelling the token tears it down.
    Teardown(CancellationToken),
    /// Backend with optional extras beyond teardown.
    Handle(BackendHandle),
    /// Purely client-side widget, nothing to run or stop.
    Inert,
}

/// Full-featured handle a factory can return instead of a bare token.
pub struct BackendHandle {
    cancel: CancellationToken,
    refresh: Option<Arc<Notify>>,
    export: Option<ExportFn>,
}

impl BackendHandle {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            refresh: None,
            export: None,
        }
    }

    /// Attach a refresh hook; notifying it should make the backend publish
    /// fresh data ahead of its normal schedule.
    pub fn with_refresh(mut self, refresh: Arc<Notify>) -> Self {
        self.refresh = Some(refresh);
        self
    }

    /// Attach a state export hook.
    pub fn with_export(mut self, export: ExportFn) -> Self {
        self.export = Some(export);
        self
    }
}

/// A backend the lifecycle manager is currently tracking.
///
/// `config` always holds the exact config of the layout item the backend was
/// started from; reconciliation compares against it to detect drift.
pub(crate) struct ActiveBackend {
    pub widget_type_id: String,
    pub config: Value,
    cancel: Option<CancellationToken>,
    refresh: Option<Arc<Notify>>,
    export: Option<ExportFn>,
}

impl ActiveBackend {
    pub fn from_outcome(widget_type_id: String, config: Value, outcome: InitOutcome) -> Self {
        let (cancel, refresh, export) = match outcome {
            InitOutcome::Teardown(token) => (Some(token), None, None),
            InitOutcome::Handle(handle) => (Some(handle.cancel), handle.refresh, handle.export),
            InitOutcome::Inert => (None, None, None),
        };
        Self {
            widget_type_id,
            config,
            cancel,
            refresh,
            export,
        }
    }

    /// Signal the backend to shut down. Cooperative: tasks observe the
    /// cancelled token and drain on their own schedule.
    pub fn stop(&self) {
        if let Some(token) = &self.cancel {
            token.cancel();
        }
    }

    /// Kick the refresh hook. Returns false when the backend has none.
    pub fn refresh(&self) -> bool {
        match &self.refresh {
            Some(notify) => {
                notify.notify_one();
                true
            }
            None => false,
        }
    }

    /// Dump backend state through the export hook, if one was attached.
    pub fn export(&self) -> Option<Value> {
        self.export.as_ref().map(|f| f())
    }
}
