use super::*;
use crate::lifecycle::{InitOutcome, WidgetContext, WidgetError};
use std::sync::Arc;

struct StubFactory {
    descriptor: WidgetTypeDescriptor,
}

impl StubFactory {
    fn new(id: &str) -> Self {
        Self {
            descriptor: WidgetTypeDescriptor::new(id, "Stub", "Inert factory for tests"),
        }
    }
}

impl WidgetFactory for StubFactory {
    fn descriptor(&self) -> &WidgetTypeDescriptor {
        &self.descriptor
    }

    fn init(&self, _ctx: WidgetContext) -> Result<InitOutcome, WidgetError> {
        Ok(InitOutcome::Inert)
    }
}

#[test]
fn test_registry_new_empty() {
    // New registry has no factories
    let registry = WidgetRegistry::new();
    assert_eq!(registry.len(), 0);
    assert!(registry.is_empty());
}

#[test]
fn test_register_and_get() {
    // Registered factory can be retrieved by its descriptor id
    let registry = WidgetRegistry::new();
    registry
        .register(Arc::new(StubFactory::new("clock-widget")))
        .unwrap();

    assert_eq!(registry.len(), 1);
    let factory = registry.get("clock-widget");
    assert!(factory.is_some());
    assert_eq!(factory.unwrap().descriptor().id, "clock-widget");
}

#[test]
fn test_get_unknown_returns_none() {
    let registry = WidgetRegistry::new();
    assert!(registry.get("nonexistent-widget").is_none());
    assert!(registry.descriptor("nonexistent-widget").is_none());
}

#[test]
fn test_register_duplicate_id_rejected() {
    // Second registration under the same id returns DuplicateWidget
    let registry = WidgetRegistry::new();
    registry
        .register(Arc::new(StubFactory::new("clock-widget")))
        .unwrap();

    let result = registry.register(Arc::new(StubFactory::new("clock-widget")));
    assert!(matches!(
        result,
        Err(RegistryError::DuplicateWidget(ref id)) if id == "clock-widget"
    ));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_register_empty_id_rejected() {
    let registry = WidgetRegistry::new();
    let result = registry.register(Arc::new(StubFactory::new("  ")));
    assert!(matches!(result, Err(RegistryError::EmptyId)));
    assert!(registry.is_empty());
}

#[test]
fn test_descriptor_lookup() {
    let registry = WidgetRegistry::new();
    registry
        .register(Arc::new(StubFactory::new("weather-widget")))
        .unwrap();

    let descriptor = registry.descriptor("weather-widget").unwrap();
    assert_eq!(descriptor.id, "weather-widget");
    assert_eq!(descriptor.name, "Stub");
}

#[test]
fn test_descriptors_sorted_by_id() {
    // Listing is deterministic regardless of registration order
    let registry = WidgetRegistry::new();
    for id in ["zeta-widget", "alpha-widget", "mid-widget"] {
        registry.register(Arc::new(StubFactory::new(id))).unwrap();
    }

    let ids: Vec<String> = registry.descriptors().iter().map(|d| d.id.clone()).collect();
    assert_eq!(
        ids,
        vec![
            "alpha-widget".to_string(),
            "mid-widget".to_string(),
            "zeta-widget".to_string()
        ]
    );
}

#[test]
fn test_with_builtins_registers_widget_set() {
    // The builtin set is registered under the <module>-widget convention
    let registry = WidgetRegistry::with_builtins();

    assert!(registry.get("clock-widget").is_some());
    assert!(registry.get("weather-widget").is_some());
    assert!(registry.get("sitemon-widget").is_some());
    assert!(registry.get("stocks-widget").is_some());
}

#[test]
fn test_builtin_descriptors_are_complete() {
    // Every builtin carries display metadata and a component hint
    let registry = WidgetRegistry::with_builtins();

    for descriptor in registry.descriptors() {
        assert!(!descriptor.id.is_empty());
        assert!(!descriptor.name.is_empty());
        assert!(!descriptor.description.is_empty());
        assert!(descriptor.component.is_some());
    }
}

#[tokio::test]
async fn test_parallel_lookups_complete() {
    // Many concurrent lookups finish quickly
    use tokio::time::{timeout, Duration};

    let registry = Arc::new(WidgetRegistry::new());
    registry
        .register(Arc::new(StubFactory::new("clock-widget")))
        .unwrap();

    let mut handles = vec![];
    for _ in 0..1_000 {
        let reg = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            assert!(reg.get("clock-widget").is_some());
            let _ = reg.descriptors();
        }));
    }

    let result = timeout(Duration::from_secs(5), async {
        for handle in handles {
            handle.await.unwrap();
        }
    })
    .await;

    assert!(result.is_ok(), "parallel lookups did not finish in time");
}
