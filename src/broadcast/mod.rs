//! In-process event bus connecting widget backends to dashboard viewers.
//!
//! Backends publish JSON payloads under a topic; the hub fans each event out
//! to every subscribed SSE stream and caches it as the latest snapshot for
//! each active instance of the matching widget type. Publishing never blocks
//! and never fails: a slow or absent viewer only misses events.

mod types;

pub use types::{DataSnapshot, SnapshotHealth, WidgetEvent};

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;

/// Default bound for the fan-out channel before slow viewers start lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Central fan-out point for widget data.
///
/// Holds the broadcast channel, the latest snapshot per active instance, and
/// the instance table maintained by the lifecycle manager. All methods are
/// synchronous and lock-free; the hub is shared behind an `Arc`.
pub struct BroadcastHub {
    sender: broadcast::Sender<WidgetEvent>,
    /// instance id -> latest snapshot
    snapshots: DashMap<String, DataSnapshot>,
    /// instance id -> widget type id, for every currently active instance
    instances: DashMap<String, String>,
}

impl BroadcastHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            snapshots: DashMap::new(),
            instances: DashMap::new(),
        }
    }

    /// Publish a payload under a topic.
    ///
    /// The topic addresses a widget type: either the bare type id or
    /// `<type id>/<channel>` for backends with several feeds. Every active
    /// instance of that type gets its snapshot replaced; every subscriber
    /// receives the event. Events for types with no active instance are
    /// still fanned out, they just leave no snapshot behind.
    pub fn publish(&self, topic: &str, payload: Value) {
        let event = WidgetEvent::now(topic, payload);

        tracing::info!(
            target: "tessera::audit",
            topic = %event.topic,
            payload = %crate::logging::payload_preview(&event.payload),
            "Widget event published"
        );

        let health = SnapshotHealth::from_payload(&event.payload);
        for entry in self.instances.iter() {
            if topic_matches(topic, entry.value()) {
                self.snapshots.insert(
                    entry.key().clone(),
                    DataSnapshot {
                        instance_id: entry.key().clone(),
                        widget_type_id: entry.value().clone(),
                        topic: event.topic.clone(),
                        payload: event.payload.clone(),
                        updated_at: event.timestamp,
                        health,
                    },
                );
            }
        }

        metrics::counter!("tessera_events_published_total").increment(1);

        // Fire and forget: Err here only means nobody is listening right now.
        let _ = self.sender.send(event);
    }

    /// Subscribe to the live event feed.
    pub fn subscribe(&self) -> broadcast::Receiver<WidgetEvent> {
        self.sender.subscribe()
    }

    /// Number of currently connected subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Record an instance as active so matching broadcasts update its
    /// snapshot. Called by the lifecycle manager when a backend starts.
    pub(crate) fn register_instance(&self, instance_id: &str, widget_type_id: &str) {
        self.instances
            .insert(instance_id.to_string(), widget_type_id.to_string());
    }

    /// Drop an instance and its snapshot. Called when a backend stops.
    pub(crate) fn deregister_instance(&self, instance_id: &str) {
        self.instances.remove(instance_id);
        self.snapshots.remove(instance_id);
    }

    /// Latest snapshot for one instance, if it has published since starting.
    pub fn snapshot(&self, instance_id: &str) -> Option<DataSnapshot> {
        self.snapshots.get(instance_id).map(|s| s.clone())
    }

    /// Number of instances currently holding a snapshot.
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// All current snapshots, ordered by instance id.
    pub fn snapshots(&self) -> Vec<DataSnapshot> {
        let mut all: Vec<DataSnapshot> = self.snapshots.iter().map(|s| s.clone()).collect();
        all.sort_by(|a, b| a.instance_id.cmp(&b.instance_id));
        all
    }

    /// Snapshots for every active instance of one widget type.
    pub fn snapshots_for_type(&self, widget_type_id: &str) -> Vec<DataSnapshot> {
        let mut matching: Vec<DataSnapshot> = self
            .snapshots
            .iter()
            .filter(|s| s.widget_type_id == widget_type_id)
            .map(|s| s.clone())
            .collect();
        matching.sort_by(|a, b| a.instance_id.cmp(&b.instance_id));
        matching
    }

    /// Currently registered `(instance id, widget type id)` pairs.
    pub fn active_instances(&self) -> Vec<(String, String)> {
        let mut active: Vec<(String, String)> = self
            .instances
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        active.sort();
        active
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

/// A topic addresses a widget type when it equals the type id exactly or
/// extends it with a `/`-separated channel suffix.
fn topic_matches(topic: &str, widget_type_id: &str) -> bool {
    topic == widget_type_id
        || topic
            .strip_prefix(widget_type_id)
            .is_some_and(|rest| rest.starts_with('/'))
}
