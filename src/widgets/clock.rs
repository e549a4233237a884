//! Clock widget: local time on an interval tick.
//!
//! The smallest complete backend. No network, no secrets; publishes
//! immediately on start, on every tick, and on refresh kicks.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::{BackendHandle, InitOutcome, WidgetContext, WidgetError};
use crate::registry::{FieldSpec, FieldType, WidgetFactory, WidgetTypeDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
enum ClockFormat {
    #[default]
    #[serde(rename = "24h")]
    TwentyFour,
    #[serde(rename = "12h")]
    Twelve,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
struct ClockConfig {
    #[serde(default)]
    format: ClockFormat,
    #[serde(default = "default_interval")]
    interval_seconds: u64,
}

fn default_interval() -> u64 {
    1
}

fn clock_payload(now: DateTime<Local>, format: ClockFormat) -> Value {
    let time = match format {
        ClockFormat::TwentyFour => now.format("%H:%M:%S").to_string(),
        ClockFormat::Twelve => now.format("%I:%M:%S %p").to_string(),
    };
    json!({
        "time": time,
        "date": now.format("%Y-%m-%d").to_string(),
        "weekday": now.format("%A").to_string(),
    })
}

pub struct ClockFactory {
    descriptor: WidgetTypeDescriptor,
}

impl ClockFactory {
    pub fn new() -> Self {
        let mut config_schema = crate::registry::FieldSchema::new();
        config_schema.insert(
            "format".to_string(),
            FieldSpec::optional(FieldType::String, json!("24h")).with_options(&["24h", "12h"]),
        );
        config_schema.insert(
            "interval_seconds".to_string(),
            FieldSpec::optional(FieldType::Number, json!(1)),
        );

        Self {
            descriptor: WidgetTypeDescriptor::new(
                "clock-widget",
                "Clock",
                "Local time and date, updated every tick",
            )
            .with_component("ClockWidget")
            .with_config_schema(config_schema),
        }
    }
}

impl Default for ClockFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetFactory for ClockFactory {
    fn descriptor(&self) -> &WidgetTypeDescriptor {
        &self.descriptor
    }

    fn init(&self, ctx: WidgetContext) -> Result<InitOutcome, WidgetError> {
        let config: ClockConfig = ctx.parse_config()?;
        let interval_seconds = config.interval_seconds.max(1);

        let cancel = CancellationToken::new();
        let refresh = Arc::new(Notify::new());
        let last = Arc::new(Mutex::new(Value::Null));

        let token = cancel.clone();
        let kick = Arc::clone(&refresh);
        let exported = Arc::clone(&last);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ctx.log.info("Clock backend started");

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        ctx.log.info("Clock backend shutting down");
                        break;
                    }
                    _ = kick.notified() => {
                        publish_tick(&ctx, config.format, &exported);
                    }
                    _ = interval.tick() => {
                        publish_tick(&ctx, config.format, &exported);
                    }
                }
            }
        });

        let export_state = Arc::clone(&last);
        Ok(InitOutcome::Handle(
            BackendHandle::new(cancel)
                .with_refresh(refresh)
                .with_export(Arc::new(move || export_state.lock().unwrap().clone())),
        ))
    }
}

fn publish_tick(ctx: &WidgetContext, format: ClockFormat, last: &Mutex<Value>) {
    let payload = clock_payload(Local::now(), format);
    *last.lock().unwrap() = payload.clone();
    ctx.publish(&ctx.widget_type_id, payload);
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_afternoon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 3, 14, 15, 9, 26).unwrap()
    }

    #[test]
    fn test_payload_24h_format() {
        let payload = clock_payload(fixed_afternoon(), ClockFormat::TwentyFour);
        assert_eq!(payload["time"], "15:09:26");
        assert_eq!(payload["date"], "2025-03-14");
        assert_eq!(payload["weekday"], "Friday");
    }

    #[test]
    fn test_payload_12h_format() {
        let payload = clock_payload(fixed_afternoon(), ClockFormat::Twelve);
        assert_eq!(payload["time"], "03:09:26 PM");
    }

    #[test]
    fn test_config_defaults() {
        let config: ClockConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config.format, ClockFormat::TwentyFour);
        assert_eq!(config.interval_seconds, 1);
    }

    #[test]
    fn test_config_rejects_unknown_format() {
        let result: Result<ClockConfig, _> = serde_json::from_value(json!({"format": "25h"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_descriptor_shape() {
        let factory = ClockFactory::new();
        let descriptor = factory.descriptor();
        assert_eq!(descriptor.id, "clock-widget");
        assert!(descriptor.secrets_schema.is_none());
        let schema = descriptor.config_schema.as_ref().unwrap();
        assert!(schema.contains_key("format"));
    }
}
