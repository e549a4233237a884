use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One widget instance placed on the dashboard grid.
///
/// Owned by the layout store; the lifecycle manager only ever reads it.
/// Unknown members round-trip through `extra` so presentation-layer fields
/// survive a save they were not written for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutItem {
    /// Opaque unique id, stable for the instance's lifetime. Assigned by the
    /// host when a client submits an empty one.
    #[serde(default)]
    pub instance_id: String,
    /// Widget type this instance renders, foreign key into the registry
    #[serde(default)]
    pub widget_type_id: String,
    #[serde(default)]
    pub x: u32,
    #[serde(default)]
    pub y: u32,
    #[serde(default)]
    pub w: u32,
    #[serde(default)]
    pub h: u32,
    /// Per-instance configuration, always a JSON object after normalization
    #[serde(default = "empty_object")]
    pub config: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl LayoutItem {
    /// Shorthand used by tests and demo layouts.
    pub fn new(instance_id: &str, widget_type_id: &str) -> Self {
        Self {
            instance_id: instance_id.to_string(),
            widget_type_id: widget_type_id.to_string(),
            x: 0,
            y: 0,
            w: 1,
            h: 1,
            config: empty_object(),
            extra: Map::new(),
        }
    }

    pub fn with_config(mut self, config: Value) -> Self {
        self.config = config;
        self
    }

    pub fn at(mut self, x: u32, y: u32, w: u32, h: u32) -> Self {
        self.x = x;
        self.y = y;
        self.w = w;
        self.h = h;
        self
    }
}
