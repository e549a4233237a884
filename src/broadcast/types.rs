//! Type definitions for the broadcast hub.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Health of a widget instance, derived from its last published payload.
///
/// A payload that is an object carrying a non-null `"error"` member counts as
/// an error report; anything else is healthy. The host never interprets the
/// payload beyond this single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotHealth {
    Healthy,
    Error,
}

impl SnapshotHealth {
    /// Derive health from a broadcast payload.
    pub fn from_payload(payload: &Value) -> Self {
        match payload.get("error") {
            Some(e) if !e.is_null() => SnapshotHealth::Error,
            _ => SnapshotHealth::Healthy,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SnapshotHealth::Error)
    }
}

/// One event published by a widget backend, fanned out to every live viewer.
///
/// Serializes to the SSE wire shape `{"type","data","timestamp"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetEvent {
    /// Topic, usually the publishing widget's type id (optionally
    /// namespaced as `<type id>/<channel>`)
    #[serde(rename = "type")]
    pub topic: String,
    /// Opaque widget payload
    #[serde(rename = "data")]
    pub payload: Value,
    /// Publish time
    pub timestamp: DateTime<Utc>,
}

impl WidgetEvent {
    /// Create an event stamped with the current time.
    pub fn now(topic: &str, payload: Value) -> Self {
        Self {
            topic: topic.to_string(),
            payload,
            timestamp: Utc::now(),
        }
    }
}

/// Last known payload for one widget instance.
///
/// Serves late-joining SSE viewers and the dashboard read endpoints without
/// waiting for the backend's next publish cycle. Overwritten on every
/// matching broadcast; deleted when the instance leaves the layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSnapshot {
    pub instance_id: String,
    pub widget_type_id: String,
    /// Topic of the broadcast that produced this snapshot
    pub topic: String,
    pub payload: Value,
    pub updated_at: DateTime<Utc>,
    pub health: SnapshotHealth,
}

impl DataSnapshot {
    /// Re-emit this snapshot as an event, e.g. for SSE replay on connect.
    pub fn to_event(&self) -> WidgetEvent {
        WidgetEvent {
            topic: self.topic.clone(),
            payload: self.payload.clone(),
            timestamp: self.updated_at,
        }
    }
}
