//! Widget Backend Registry module.
//!
//! Maps widget type ids to their backend initializers. The registry is built
//! once at startup from the builtin widget set; there is no hot reload.
//!
//! Discovery is a registration interface rather than a directory scan: each
//! widget module declares a [`WidgetFactory`] carrying its
//! [`WidgetTypeDescriptor`], and a failed registration (duplicate or empty
//! id) is logged and skipped without aborting the rest of the pass.

mod descriptor;
mod error;
#[cfg(test)]
mod tests;

pub use descriptor::*;
pub use error::*;

use crate::lifecycle::{InitOutcome, WidgetContext, WidgetError};
use dashmap::DashMap;
use std::sync::Arc;

/// Backend initializer for one widget type.
///
/// `init` is synchronous dispatch: the factory validates its inputs, spawns
/// whatever tokio tasks the backend needs, and returns immediately. The
/// reconciler never awaits a backend's internal lifecycle.
pub trait WidgetFactory: Send + Sync {
    /// Static description of the widget type this factory backs.
    fn descriptor(&self) -> &WidgetTypeDescriptor;

    /// Start a backend for one widget instance.
    ///
    /// Errors are caught by the lifecycle manager: the instance is logged as
    /// failed and retried on the next reconciliation pass.
    fn init(&self, ctx: WidgetContext) -> Result<InitOutcome, WidgetError>;
}

/// The Widget Registry stores every known widget backend factory.
///
/// # Examples
///
/// ```
/// use tessera::registry::WidgetRegistry;
///
/// let registry = WidgetRegistry::with_builtins();
/// assert!(registry.get("clock-widget").is_some());
/// assert!(registry.get("no-such-widget").is_none());
/// ```
pub struct WidgetRegistry {
    factories: DashMap<String, Arc<dyn WidgetFactory>>,
}

impl WidgetRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: DashMap::new(),
        }
    }

    /// Create a registry populated with the builtin widget set.
    ///
    /// A registration failure for one widget never prevents the others from
    /// registering; it is logged and the pass continues.
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        for factory in crate::widgets::builtin() {
            let id = factory.descriptor().id.clone();
            if let Err(e) = registry.register(factory) {
                tracing::warn!(widget = %id, error = %e, "Skipping builtin widget registration");
            }
        }
        tracing::info!(widgets = registry.len(), "Widget registry initialized");
        registry
    }

    /// Register a widget backend factory.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::DuplicateWidget` if the descriptor id is
    /// already taken, `RegistryError::EmptyId` if it is blank.
    pub fn register(&self, factory: Arc<dyn WidgetFactory>) -> Result<(), RegistryError> {
        let id = factory.descriptor().id.clone();
        if id.trim().is_empty() {
            return Err(RegistryError::EmptyId);
        }
        if self.factories.contains_key(&id) {
            return Err(RegistryError::DuplicateWidget(id));
        }
        self.factories.insert(id, factory);
        Ok(())
    }

    /// Look up the factory for a widget type.
    pub fn get(&self, widget_type_id: &str) -> Option<Arc<dyn WidgetFactory>> {
        self.factories.get(widget_type_id).map(|e| Arc::clone(e.value()))
    }

    /// Look up the descriptor for a widget type.
    pub fn descriptor(&self, widget_type_id: &str) -> Option<WidgetTypeDescriptor> {
        self.factories
            .get(widget_type_id)
            .map(|e| e.value().descriptor().clone())
    }

    /// All registered descriptors, ordered by id for stable listings.
    pub fn descriptors(&self) -> Vec<WidgetTypeDescriptor> {
        let mut all: Vec<_> = self
            .factories
            .iter()
            .map(|e| e.value().descriptor().clone())
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Number of registered widget types.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no widget type is registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl Default for WidgetRegistry {
    fn default() -> Self {
        Self::new()
    }
}
