//! Site monitor widget: probes one URL and reports status and latency.
//!
//! A failed probe (transport error or non-2xx/3xx status) publishes an
//! error-shaped payload so the snapshot health and the ai-summary reflect
//! the outage. Probe counters are available through the export hook.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::{BackendHandle, InitOutcome, WidgetContext, WidgetError};
use crate::registry::{FieldSchema, FieldSpec, FieldType, WidgetFactory, WidgetTypeDescriptor};

#[derive(Debug, Clone, Default, Deserialize)]
struct SitemonConfig {
    #[serde(default)]
    url: String,
    #[serde(default = "default_interval")]
    interval_seconds: u64,
    #[serde(default = "default_timeout")]
    timeout_seconds: u64,
}

fn default_interval() -> u64 {
    60
}

fn default_timeout() -> u64 {
    10
}

#[derive(Debug, Default)]
struct ProbeStats {
    probes: u64,
    failures: u64,
    last_status: Option<u16>,
    last_latency_ms: Option<u64>,
}

impl ProbeStats {
    fn export(&self) -> Value {
        json!({
            "probes": self.probes,
            "failures": self.failures,
            "lastStatus": self.last_status,
            "lastLatencyMs": self.last_latency_ms,
        })
    }
}

enum ProbeOutcome {
    /// Response received; up iff the status is not a client/server error
    Responded { status: u16, latency_ms: u64 },
    Failed { message: String, latency_ms: u64 },
}

fn probe_payload(url: &str, outcome: &ProbeOutcome) -> Value {
    match outcome {
        ProbeOutcome::Responded { status, latency_ms } if *status < 400 => json!({
            "url": url,
            "up": true,
            "status": status,
            "latencyMs": latency_ms,
        }),
        ProbeOutcome::Responded { status, latency_ms } => json!({
            "url": url,
            "up": false,
            "status": status,
            "latencyMs": latency_ms,
            "error": format!("HTTP {status}"),
        }),
        ProbeOutcome::Failed { message, latency_ms } => json!({
            "url": url,
            "up": false,
            "latencyMs": latency_ms,
            "error": message,
        }),
    }
}

async fn probe(client: &reqwest::Client, url: &str) -> ProbeOutcome {
    let started = Instant::now();
    match client.get(url).send().await {
        Ok(response) => ProbeOutcome::Responded {
            status: response.status().as_u16(),
            latency_ms: started.elapsed().as_millis() as u64,
        },
        Err(e) => ProbeOutcome::Failed {
            message: e.to_string(),
            latency_ms: started.elapsed().as_millis() as u64,
        },
    }
}

pub struct SitemonFactory {
    descriptor: WidgetTypeDescriptor,
}

impl SitemonFactory {
    pub fn new() -> Self {
        let mut config_schema = FieldSchema::new();
        config_schema.insert("url".to_string(), FieldSpec::required(FieldType::String));
        config_schema.insert(
            "interval_seconds".to_string(),
            FieldSpec::optional(FieldType::Number, json!(default_interval())),
        );
        config_schema.insert(
            "timeout_seconds".to_string(),
            FieldSpec::optional(FieldType::Number, json!(default_timeout())),
        );

        let mut export_schema = FieldSchema::new();
        export_schema.insert("probes".to_string(), FieldSpec::required(FieldType::Number));
        export_schema.insert(
            "failures".to_string(),
            FieldSpec::required(FieldType::Number),
        );

        Self {
            descriptor: WidgetTypeDescriptor::new(
                "sitemon-widget",
                "Site Monitor",
                "Availability and latency of one HTTP endpoint",
            )
            .with_component("SitemonWidget")
            .with_config_schema(config_schema)
            .with_export_schema(export_schema),
        }
    }
}

impl Default for SitemonFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetFactory for SitemonFactory {
    fn descriptor(&self) -> &WidgetTypeDescriptor {
        &self.descriptor
    }

    fn init(&self, ctx: WidgetContext) -> Result<InitOutcome, WidgetError> {
        let config: SitemonConfig = ctx.parse_config()?;
        if config.url.trim().is_empty() {
            return Err(WidgetError::InvalidConfig(
                "sitemon requires a url".to_string(),
            ));
        }
        let interval_seconds = config.interval_seconds.max(5);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()
            .map_err(|e| WidgetError::Init(e.to_string()))?;

        let cancel = CancellationToken::new();
        let refresh = Arc::new(Notify::new());
        let stats = Arc::new(Mutex::new(ProbeStats::default()));

        let token = cancel.clone();
        let kick = Arc::clone(&refresh);
        let counters = Arc::clone(&stats);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            ctx.log.info(&format!("Site monitor started for {}", config.url));

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        ctx.log.info("Site monitor shutting down");
                        break;
                    }
                    _ = kick.notified() => {
                        run_probe(&ctx, &client, &config.url, &counters).await;
                    }
                    _ = interval.tick() => {
                        run_probe(&ctx, &client, &config.url, &counters).await;
                    }
                }
            }
        });

        let export_state = Arc::clone(&stats);
        Ok(InitOutcome::Handle(
            BackendHandle::new(cancel)
                .with_refresh(refresh)
                .with_export(Arc::new(move || export_state.lock().unwrap().export())),
        ))
    }
}

async fn run_probe(
    ctx: &WidgetContext,
    client: &reqwest::Client,
    url: &str,
    stats: &Mutex<ProbeStats>,
) {
    let outcome = probe(client, url).await;
    let payload = probe_payload(url, &outcome);

    {
        let mut stats = stats.lock().unwrap();
        stats.probes += 1;
        match &outcome {
            ProbeOutcome::Responded { status, latency_ms } => {
                stats.last_status = Some(*status);
                stats.last_latency_ms = Some(*latency_ms);
                if *status >= 400 {
                    stats.failures += 1;
                }
            }
            ProbeOutcome::Failed { latency_ms, .. } => {
                stats.last_status = None;
                stats.last_latency_ms = Some(*latency_ms);
                stats.failures += 1;
            }
        }
    }

    if payload.get("error").is_some() {
        ctx.log.warn(&format!("Probe failed for {url}"));
    }
    ctx.publish(&ctx.widget_type_id, payload);
}
