//! Weather widget: polls the Open-Meteo current-weather API.
//!
//! Open-Meteo needs no API key, so this plugin shows plain external polling
//! without the secrets machinery. Upstream failures are reported as
//! error-shaped payloads, never as init errors.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::{BackendHandle, InitOutcome, WidgetContext, WidgetError};
use crate::registry::{FieldSchema, FieldSpec, FieldType, WidgetFactory, WidgetTypeDescriptor};

const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Deserialize)]
struct WeatherConfig {
    #[serde(default = "default_latitude")]
    latitude: f64,
    #[serde(default = "default_longitude")]
    longitude: f64,
    #[serde(default = "default_interval")]
    interval_seconds: u64,
    #[serde(default)]
    base_url: Option<String>,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            latitude: default_latitude(),
            longitude: default_longitude(),
            interval_seconds: default_interval(),
            base_url: None,
        }
    }
}

fn default_latitude() -> f64 {
    52.52
}

fn default_longitude() -> f64 {
    13.405
}

fn default_interval() -> u64 {
    600
}

/// Shape the broadcast payload from an Open-Meteo response body.
fn weather_payload(latitude: f64, longitude: f64, body: &Value) -> Value {
    let Some(current) = body.get("current_weather") else {
        return error_payload(latitude, longitude, "response carried no current_weather");
    };
    json!({
        "latitude": latitude,
        "longitude": longitude,
        "temperatureC": current.get("temperature"),
        "windSpeedKmh": current.get("windspeed"),
        "weatherCode": current.get("weathercode"),
        "observedAt": current.get("time"),
    })
}

fn error_payload(latitude: f64, longitude: f64, message: &str) -> Value {
    json!({
        "latitude": latitude,
        "longitude": longitude,
        "error": message,
    })
}

async fn fetch_weather(client: &reqwest::Client, base_url: &str, config: &WeatherConfig) -> Value {
    let url = format!(
        "{}/v1/forecast?latitude={}&longitude={}&current_weather=true",
        base_url.trim_end_matches('/'),
        config.latitude,
        config.longitude
    );

    let response = match client.get(&url).send().await {
        Ok(r) => r,
        Err(e) => {
            return error_payload(
                config.latitude,
                config.longitude,
                &format!("request failed: {e}"),
            )
        }
    };
    if !response.status().is_success() {
        return error_payload(
            config.latitude,
            config.longitude,
            &format!("weather API returned HTTP {}", response.status().as_u16()),
        );
    }
    match response.json::<Value>().await {
        Ok(body) => weather_payload(config.latitude, config.longitude, &body),
        Err(e) => error_payload(
            config.latitude,
            config.longitude,
            &format!("invalid weather API response: {e}"),
        ),
    }
}

pub struct WeatherFactory {
    descriptor: WidgetTypeDescriptor,
}

impl WeatherFactory {
    pub fn new() -> Self {
        let mut config_schema = FieldSchema::new();
        config_schema.insert(
            "latitude".to_string(),
            FieldSpec::optional(FieldType::Number, json!(default_latitude())),
        );
        config_schema.insert(
            "longitude".to_string(),
            FieldSpec::optional(FieldType::Number, json!(default_longitude())),
        );
        config_schema.insert(
            "interval_seconds".to_string(),
            FieldSpec::optional(FieldType::Number, json!(default_interval())),
        );
        config_schema.insert(
            "base_url".to_string(),
            FieldSpec::optional(FieldType::String, json!(DEFAULT_BASE_URL)),
        );

        Self {
            descriptor: WidgetTypeDescriptor::new(
                "weather-widget",
                "Weather",
                "Current conditions for a fixed location via Open-Meteo",
            )
            .with_component("WeatherWidget")
            .with_config_schema(config_schema),
        }
    }
}

impl Default for WeatherFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetFactory for WeatherFactory {
    fn descriptor(&self) -> &WidgetTypeDescriptor {
        &self.descriptor
    }

    fn init(&self, ctx: WidgetContext) -> Result<InitOutcome, WidgetError> {
        let config: WeatherConfig = ctx.parse_config()?;
        let interval_seconds = config.interval_seconds.max(30);

        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| WidgetError::Init(e.to_string()))?;

        let cancel = CancellationToken::new();
        let refresh = Arc::new(Notify::new());

        let token = cancel.clone();
        let kick = Arc::clone(&refresh);
        tokio::spawn(async move {
            let base_url = config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
            let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ctx.log.info("Weather backend started");

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        ctx.log.info("Weather backend shutting down");
                        break;
                    }
                    _ = kick.notified() => {
                        let payload = fetch_weather(&client, &base_url, &config).await;
                        ctx.publish(&ctx.widget_type_id, payload);
                    }
                    _ = interval.tick() => {
                        let payload = fetch_weather(&client, &base_url, &config).await;
                        if payload.get("error").is_some() {
                            ctx.log.warn("Weather poll failed, publishing error payload");
                        }
                        ctx.publish(&ctx.widget_type_id, payload);
                    }
                }
            }
        });

        Ok(InitOutcome::Handle(
            BackendHandle::new(cancel).with_refresh(refresh),
        ))
    }
}
