//! Broadcast hub configuration

use serde::{Deserialize, Serialize};

use crate::broadcast::DEFAULT_CHANNEL_CAPACITY;

/// Event fan-out configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcastConfig {
    /// Buffered events per subscriber before lagging slow consumers.
    pub capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}
