//! Stocks widget: quote polling gated on a per-type secret.
//!
//! The backend requires an `api_key` secret. Without one it still starts,
//! but only publishes an error-shaped payload telling the operator what to
//! configure; it never touches the network. Writing the secret restarts the
//! backend via the reconciler, which flips it into the real polling loop.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::lifecycle::{BackendHandle, InitOutcome, WidgetContext, WidgetError};
use crate::registry::{FieldSchema, FieldSpec, FieldType, WidgetFactory, WidgetTypeDescriptor};

const DEFAULT_BASE_URL: &str = "https://finnhub.io";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_SYMBOLS: usize = 10;

#[derive(Debug, Clone, Deserialize)]
struct StocksConfig {
    #[serde(default = "default_symbols")]
    symbols: String,
    #[serde(default = "default_interval")]
    interval_seconds: u64,
    #[serde(default)]
    base_url: Option<String>,
}

impl Default for StocksConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            interval_seconds: default_interval(),
            base_url: None,
        }
    }
}

fn default_symbols() -> String {
    "AAPL".to_string()
}

fn default_interval() -> u64 {
    300
}

/// Split a comma-separated symbol list: trimmed, uppercased, deduplicated,
/// capped so one widget cannot fan out unbounded requests.
fn parse_symbols(raw: &str) -> Vec<String> {
    let mut symbols = Vec::new();
    for part in raw.split(',') {
        let symbol = part.trim().to_uppercase();
        if !symbol.is_empty() && !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
        if symbols.len() == MAX_SYMBOLS {
            break;
        }
    }
    symbols
}

fn missing_key_payload() -> Value {
    json!({
        "error": "api_key secret not configured; add one under widget secrets to enable quotes",
    })
}

enum SymbolResult {
    Quote { price: Value, change: Value, percent: Value },
    Failed(String),
}

/// Merge per-symbol results into one broadcast payload. All symbols failing
/// (or an empty symbol list) yields an error-shaped payload.
fn quotes_payload(results: &BTreeMap<String, SymbolResult>) -> Value {
    let mut quotes = serde_json::Map::new();
    let mut failed = serde_json::Map::new();

    for (symbol, result) in results {
        match result {
            SymbolResult::Quote {
                price,
                change,
                percent,
            } => {
                quotes.insert(
                    symbol.clone(),
                    json!({
                        "price": price,
                        "change": change,
                        "changePercent": percent,
                    }),
                );
            }
            SymbolResult::Failed(message) => {
                failed.insert(symbol.clone(), json!(message));
            }
        }
    }

    if quotes.is_empty() {
        return json!({
            "error": "all quote lookups failed",
            "failed": failed,
        });
    }

    let mut payload = json!({ "quotes": quotes });
    if !failed.is_empty() {
        payload["failed"] = Value::Object(failed);
    }
    payload
}

async fn fetch_quote(
    client: &reqwest::Client,
    base_url: &str,
    symbol: &str,
    api_key: &str,
) -> Result<SymbolResult, AuthRejected> {
    let url = format!(
        "{}/api/v1/quote?symbol={}&token={}",
        base_url.trim_end_matches('/'),
        symbol,
        api_key
    );

    let response = match client.get(&url).send().await {
        Ok(r) => r,
        Err(e) => return Ok(SymbolResult::Failed(format!("request failed: {e}"))),
    };
    let status = response.status();
    if status.as_u16() == 401 || status.as_u16() == 403 {
        return Err(AuthRejected);
    }
    if !status.is_success() {
        return Ok(SymbolResult::Failed(format!(
            "quote API returned HTTP {}",
            status.as_u16()
        )));
    }
    match response.json::<Value>().await {
        Ok(body) => Ok(SymbolResult::Quote {
            price: body.get("c").cloned().unwrap_or(Value::Null),
            change: body.get("d").cloned().unwrap_or(Value::Null),
            percent: body.get("dp").cloned().unwrap_or(Value::Null),
        }),
        Err(e) => Ok(SymbolResult::Failed(format!("invalid quote response: {e}"))),
    }
}

struct AuthRejected;

async fn poll_quotes(
    client: &reqwest::Client,
    base_url: &str,
    symbols: &[String],
    api_key: &str,
) -> Value {
    let mut results = BTreeMap::new();
    for symbol in symbols {
        match fetch_quote(client, base_url, symbol, api_key).await {
            Ok(result) => {
                results.insert(symbol.clone(), result);
            }
            Err(AuthRejected) => {
                return json!({
                    "error": "quote API rejected the configured api_key",
                });
            }
        }
    }
    quotes_payload(&results)
}

pub struct StocksFactory {
    descriptor: WidgetTypeDescriptor,
}

impl StocksFactory {
    pub fn new() -> Self {
        let mut secrets_schema = FieldSchema::new();
        secrets_schema.insert(
            "api_key".to_string(),
            FieldSpec::required(FieldType::String),
        );

        let mut config_schema = FieldSchema::new();
        config_schema.insert(
            "symbols".to_string(),
            FieldSpec::optional(FieldType::String, json!(default_symbols())),
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
                "stocks-widget",
                "Stocks",
                "Quote ticker for a list of symbols, needs a quote API key",
            )
            .with_component("StocksWidget")
            .with_secrets_schema(secrets_schema)
            .with_config_schema(config_schema),
        }
    }
}

impl Default for StocksFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl WidgetFactory for StocksFactory {
    fn descriptor(&self) -> &WidgetTypeDescriptor {
        &self.descriptor
    }

    fn init(&self, ctx: WidgetContext) -> Result<InitOutcome, WidgetError> {
        let config: StocksConfig = ctx.parse_config()?;

        let api_key = match ctx.secret("api_key").map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => {
                // The gate: no key, no network. Publish the error state right
                // away so the dashboard shows what to fix, and keep answering
                // refresh kicks with the same message.
                ctx.log
                    .warn("No api_key secret configured, quotes are disabled");
                ctx.publish(&ctx.widget_type_id, missing_key_payload());

                let cancel = CancellationToken::new();
                let refresh = Arc::new(Notify::new());
                let token = cancel.clone();
                let kick = Arc::clone(&refresh);
                tokio::spawn(async move {
                    loop {
                        tokio::select! {
                            _ = token.cancelled() => break,
                            _ = kick.notified() => {
                                ctx.publish(&ctx.widget_type_id, missing_key_payload());
                            }
                        }
                    }
                });

                return Ok(InitOutcome::Handle(
                    BackendHandle::new(cancel).with_refresh(refresh),
                ));
            }
        };

        let symbols = parse_symbols(&config.symbols);
        if symbols.is_empty() {
            return Err(WidgetError::InvalidConfig(
                "symbols must name at least one ticker".to_string(),
            ));
        }
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
            ctx.log
                .info(&format!("Stocks backend started for {}", symbols.join(", ")));

            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        ctx.log.info("Stocks backend shutting down");
                        break;
                    }
                    _ = kick.notified() => {
                        let payload = poll_quotes(&client, &base_url, &symbols, &api_key).await;
                        ctx.publish(&ctx.widget_type_id, payload);
                    }
                    _ = interval.tick() => {
                        let payload = poll_quotes(&client, &base_url, &symbols, &api_key).await;
                        if payload.get("error").is_some() {
                            ctx.log.warn("Quote poll failed, publishing error payload");
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
