//! Response bodies for the JSON stats endpoint.

use serde::Serialize;

/// Body of `GET /v1/stats`.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Host uptime in seconds since startup
    pub uptime_seconds: u64,
    /// Number of registered widget types
    pub widget_types: usize,
    /// Number of running backend instances
    pub active_backends: usize,
    /// Number of connected SSE viewers
    pub sse_subscribers: usize,
    /// Per-widget-type breakdown
    pub widgets: Vec<WidgetTypeStats>,
}

/// Per-widget-type statistics.
#[derive(Debug, Clone, Serialize)]
pub struct WidgetTypeStats {
    /// Widget type id
    pub id: String,
    /// Display name from the descriptor
    pub name: String,
    /// Running backend instances of this type
    pub active_instances: usize,
    /// Instances whose latest snapshot is error-shaped
    pub error_instances: usize,
    /// Whether a secrets bucket exists for this type (never the values)
    pub secrets_configured: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_uses_snake_case_fields() {
        let response = StatsResponse {
            uptime_seconds: 3600,
            widget_types: 4,
            active_backends: 2,
            sse_subscribers: 1,
            widgets: vec![WidgetTypeStats {
                id: "clock-widget".to_string(),
                name: "Clock".to_string(),
                active_instances: 2,
                error_instances: 0,
                secrets_configured: false,
            }],
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"uptime_seconds\":3600"));
        assert!(json.contains("clock-widget"));
        assert!(json.contains("secrets_configured"));
    }

    #[test]
    fn test_widget_type_stats_never_carries_values() {
        let stats = WidgetTypeStats {
            id: "stocks-widget".to_string(),
            name: "Stocks".to_string(),
            active_instances: 1,
            error_instances: 1,
            secrets_configured: true,
        };

        let json = serde_json::to_string(&stats).unwrap();
        // Only the existence flag is exposed
        assert!(json.contains("\"secrets_configured\":true"));
        assert!(!json.contains("api_key"));
    }
}
