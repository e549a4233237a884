//! Structured logging helpers
//!
//! Two dedicated tracing targets exist alongside the module-path defaults:
//! `tessera::audit` carries one line per published widget event, and
//! `tessera::widget` carries everything backends emit through their
//! [`WidgetLog`](crate::lifecycle::WidgetLog). Both can be tuned with filter
//! directives, e.g. `info,tessera::audit=warn` to quiet the audit feed.

use serde_json::Value;

/// Longest payload preview written to the audit log.
const PREVIEW_MAX_LEN: usize = 120;

/// Translate the configured level into tracing filter directives.
///
/// A plain level ("info", "debug", ...) becomes the base directive with the
/// chatty HTTP dependencies capped at warn. A value that already contains
/// `=` or `,` is treated as a full tracing filter and passed through
/// untouched, so operators keep complete control when they want it.
///
/// # Examples
///
/// ```
/// use tessera::config::LoggingConfig;
/// use tessera::logging::build_filter_directives;
///
/// let mut config = LoggingConfig::default();
/// assert_eq!(build_filter_directives(&config), "info,hyper=warn,reqwest=warn");
///
/// config.level = "info,tessera::audit=warn".to_string();
/// assert_eq!(build_filter_directives(&config), "info,tessera::audit=warn");
/// ```
pub fn build_filter_directives(config: &crate::config::LoggingConfig) -> String {
    if config.level.contains('=') || config.level.contains(',') {
        return config.level.clone();
    }
    format!("{},hyper=warn,reqwest=warn", config.level)
}

/// Compact single-line rendering of a payload for the audit log.
///
/// Full payloads can be arbitrarily large; the audit line only needs enough
/// to identify the event. Truncation is on character boundaries.
pub fn payload_preview(payload: &Value) -> String {
    let rendered = payload.to_string();
    if rendered.chars().count() <= PREVIEW_MAX_LEN {
        return rendered;
    }
    let truncated: String = rendered.chars().take(PREVIEW_MAX_LEN).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingConfig;
    use serde_json::json;

    #[test]
    fn test_build_filter_plain_level() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            ..Default::default()
        };
        assert_eq!(
            build_filter_directives(&config),
            "debug,hyper=warn,reqwest=warn"
        );
    }

    #[test]
    fn test_build_filter_passes_directives_through() {
        let config = LoggingConfig {
            level: "warn,tessera::widget=debug".to_string(),
            ..Default::default()
        };
        assert_eq!(
            build_filter_directives(&config),
            "warn,tessera::widget=debug"
        );
    }

    #[test]
    fn test_payload_preview_short_payload_unchanged() {
        let preview = payload_preview(&json!({"time": "12:00"}));
        assert_eq!(preview, r#"{"time":"12:00"}"#);
    }

    #[test]
    fn test_payload_preview_truncates_long_payload() {
        let long = "x".repeat(500);
        let preview = payload_preview(&json!({ "blob": long }));
        assert!(preview.len() < 200);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn test_payload_preview_multibyte_safe() {
        let text = "ẞ".repeat(300);
        let preview = payload_preview(&json!(text));
        assert!(preview.ends_with("..."));
    }
}
