//! Per-instance context handed to widget factories at init time.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::broadcast::BroadcastHub;

use super::WidgetError;

/// Everything a factory needs to start a backend for one widget instance.
///
/// Cloneable so factories can move it into spawned tasks.
#[derive(Clone)]
pub struct WidgetContext {
    /// Layout instance this backend serves
    pub instance_id: String,
    /// Widget type id, also the default publish topic
    pub widget_type_id: String,
    /// Instance config from the layout item, always a JSON object
    pub config: Value,
    /// Decrypted secrets for this widget type, `{}` when none are stored
    pub secrets: Value,
    /// Structured logger scoped to this instance
    pub log: WidgetLog,
    hub: Arc<BroadcastHub>,
}

impl WidgetContext {
    pub(crate) fn new(
        instance_id: String,
        widget_type_id: String,
        config: Value,
        secrets: Value,
        hub: Arc<BroadcastHub>,
    ) -> Self {
        let log = WidgetLog::new(&widget_type_id, &instance_id);
        Self {
            instance_id,
            widget_type_id,
            config,
            secrets,
            log,
            hub,
        }
    }

    /// Publish a payload to the hub under an explicit topic.
    ///
    /// Most backends pass their own `widget_type_id`; multi-feed backends
    /// append a `/`-separated channel.
    pub fn publish(&self, topic: &str, payload: Value) {
        self.hub.publish(topic, payload);
    }

    /// Deserialize the instance config into a typed struct.
    ///
    /// Unknown members are ignored; missing members fall back to the
    /// struct's serde defaults. An empty config yields `T::default()`.
    pub fn parse_config<T>(&self) -> Result<T, WidgetError>
    where
        T: DeserializeOwned + Default,
    {
        if self.config.is_null() {
            return Ok(T::default());
        }
        serde_json::from_value(self.config.clone())
            .map_err(|e| WidgetError::InvalidConfig(e.to_string()))
    }

    /// Fetch one secret as a string, if present.
    pub fn secret(&self, key: &str) -> Option<&str> {
        self.secrets.get(key).and_then(Value::as_str)
    }
}

/// Logger that stamps every line with the owning widget type and instance.
///
/// Lines go to the `tessera::widget` target so host and widget output can be
/// filtered apart.
#[derive(Clone)]
pub struct WidgetLog {
    widget: String,
    instance: String,
}

impl WidgetLog {
    fn new(widget: &str, instance: &str) -> Self {
        Self {
            widget: widget.to_string(),
            instance: instance.to_string(),
        }
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!(
            target: "tessera::widget",
            widget = %self.widget,
            instance = %self.instance,
            "{message}"
        );
    }

    pub fn info(&self, message: &str) {
        tracing::info!(
            target: "tessera::widget",
            widget = %self.widget,
            instance = %self.instance,
            "{message}"
        );
    }

    pub fn warn(&self, message: &str) {
        tracing::warn!(
            target: "tessera::widget",
            widget = %self.widget,
            instance = %self.instance,
            "{message}"
        );
    }

    pub fn error(&self, message: &str) {
        tracing::error!(
            target: "tessera::widget",
            widget = %self.widget,
            instance = %self.instance,
            "{message}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct TickConfig {
        #[serde(default)]
        interval_seconds: u64,
        #[serde(default)]
        label: String,
    }

    fn context_with(config: Value, secrets: Value) -> WidgetContext {
        WidgetContext::new(
            "inst-1".to_string(),
            "clock-widget".to_string(),
            config,
            secrets,
            Arc::new(BroadcastHub::new(4)),
        )
    }

    #[test]
    fn test_parse_config_fills_missing_fields() {
        let ctx = context_with(json!({"label": "office"}), json!({}));
        let parsed: TickConfig = ctx.parse_config().unwrap();
        assert_eq!(parsed.label, "office");
        assert_eq!(parsed.interval_seconds, 0);
    }

    #[test]
    fn test_parse_config_ignores_unknown_fields() {
        let ctx = context_with(json!({"intervalSecondsTypo": 5, "label": "x"}), json!({}));
        let parsed: TickConfig = ctx.parse_config().unwrap();
        assert_eq!(parsed.label, "x");
    }

    #[test]
    fn test_parse_config_rejects_wrong_types() {
        let ctx = context_with(json!({"interval_seconds": "soon"}), json!({}));
        let result: Result<TickConfig, _> = ctx.parse_config();
        assert!(matches!(result, Err(WidgetError::InvalidConfig(_))));
    }

    #[test]
    fn test_secret_lookup() {
        let ctx = context_with(json!({}), json!({"api_key": "k-123", "count": 3}));
        assert_eq!(ctx.secret("api_key"), Some("k-123"));
        assert_eq!(ctx.secret("count"), None);
        assert_eq!(ctx.secret("missing"), None);
    }
}
