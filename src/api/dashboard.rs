//! Read-only aggregation endpoints for external monitoring and AI consumers.
//!
//! These handlers join the persisted layout with the snapshot cache and, for
//! the detail endpoints, each backend's on-demand export. Nothing here
//! mutates host state; export data is fetched per request and never cached.

use crate::api::{ApiError, AppState};
use crate::broadcast::{DataSnapshot, SnapshotHealth};
use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// One widget entry in the full snapshot view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    pub instance_id: String,
    pub widget_type_id: String,
    /// Display name from the registered descriptor, absent for orphans
    pub name: Option<String>,
    pub data: Option<Value>,
    pub updated_at: Option<DateTime<Utc>>,
    pub health: Option<SnapshotHealth>,
}

/// Widget counts shared by the snapshot and summary views.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetCounts {
    pub total: usize,
    pub with_data: usize,
    pub errors: usize,
}

/// Response for GET /dashboard/snapshot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub summary: WidgetCounts,
    pub widgets: Vec<SnapshotEntry>,
}

/// One condensed widget entry in the AI summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryEntry {
    pub instance_id: String,
    pub widget_type_id: String,
    pub name: Option<String>,
    pub has_data: bool,
    pub health: Option<SnapshotHealth>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Response for GET /dashboard/ai-summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiSummary {
    pub generated_at: DateTime<Utc>,
    pub overall_state: &'static str,
    pub counts: WidgetCounts,
    pub widgets: Vec<SummaryEntry>,
}

/// Response for GET /dashboard/widget/{instanceId}.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetDetail {
    pub instance_id: String,
    pub widget_type_id: String,
    pub config: Value,
    pub snapshot: Option<DataSnapshot>,
    pub export: Option<Value>,
}

/// One instance entry in the widget type detail.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeInstance {
    pub instance_id: String,
    pub config: Value,
    pub snapshot: Option<DataSnapshot>,
    pub export: Option<Value>,
}

/// Response for GET /dashboard/widget-type/{widgetTypeId}.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetTypeDetail {
    pub widget_type_id: String,
    pub descriptor: Option<crate::registry::WidgetTypeDescriptor>,
    pub has_secrets: bool,
    pub instances: Vec<TypeInstance>,
}

/// Overall dashboard state from widget counts.
///
/// Checked in precedence order: no data at all, errors in more than half,
/// any error or partial data, then operational.
fn overall_state(total: usize, with_data: usize, errors: usize) -> &'static str {
    if total == 0 || with_data == 0 {
        "no_data"
    } else if errors * 2 > total {
        "critical"
    } else if errors > 0 || with_data < total {
        "degraded"
    } else {
        "operational"
    }
}

fn counts_of(entries: &[SnapshotEntry]) -> WidgetCounts {
    WidgetCounts {
        total: entries.len(),
        with_data: entries.iter().filter(|e| e.data.is_some()).count(),
        errors: entries
            .iter()
            .filter(|e| e.health.is_some_and(|h| h.is_error()))
            .count(),
    }
}

/// Join every layout item with its snapshot, in layout order.
fn collect_entries(state: &AppState) -> Vec<SnapshotEntry> {
    state
        .layout
        .items()
        .into_iter()
        .map(|item| {
            let snapshot = state.hub.snapshot(&item.instance_id);
            let name = state
                .registry
                .descriptor(&item.widget_type_id)
                .map(|d| d.name);

            SnapshotEntry {
                instance_id: item.instance_id,
                widget_type_id: item.widget_type_id,
                name,
                data: snapshot.as_ref().map(|s| s.payload.clone()),
                updated_at: snapshot.as_ref().map(|s| s.updated_at),
                health: snapshot.as_ref().map(|s| s.health),
            }
        })
        .collect()
}

/// GET /dashboard/snapshot - Full dashboard state in one document.
///
/// Every placed widget appears, with nulls where nothing was published yet.
pub async fn snapshot_handler(State(state): State<Arc<AppState>>) -> Json<DashboardSnapshot> {
    let widgets = collect_entries(&state);

    Json(DashboardSnapshot {
        generated_at: Utc::now(),
        summary: counts_of(&widgets),
        widgets,
    })
}

/// GET /dashboard/ai-summary - Condensed health view with an overall verdict.
pub async fn ai_summary_handler(State(state): State<Arc<AppState>>) -> Json<AiSummary> {
    let entries = collect_entries(&state);
    let counts = counts_of(&entries);

    let widgets = entries
        .into_iter()
        .map(|e| SummaryEntry {
            instance_id: e.instance_id,
            widget_type_id: e.widget_type_id,
            name: e.name,
            has_data: e.data.is_some(),
            health: e.health,
            updated_at: e.updated_at,
        })
        .collect();

    Json(AiSummary {
        generated_at: Utc::now(),
        overall_state: overall_state(counts.total, counts.with_data, counts.errors),
        counts,
        widgets,
    })
}

/// GET /dashboard/widget/{instanceId} - Everything known about one instance.
///
/// 404 when the instance is not in the layout. Export data is fetched from
/// the running backend on each call; instances without a backend or without
/// an export hook report null.
pub async fn widget_handler(
    State(state): State<Arc<AppState>>,
    Path(instance_id): Path<String>,
) -> Result<Json<WidgetDetail>, ApiError> {
    let item = state
        .layout
        .items()
        .into_iter()
        .find(|item| item.instance_id == instance_id)
        .ok_or_else(|| {
            ApiError::not_found(&format!("No widget instance with id {:?}", instance_id))
        })?;

    Ok(Json(WidgetDetail {
        snapshot: state.hub.snapshot(&item.instance_id),
        export: state.lifecycle.export(&item.instance_id),
        instance_id: item.instance_id,
        widget_type_id: item.widget_type_id,
        config: item.config,
    }))
}

/// GET /dashboard/widget-type/{widgetTypeId} - Per-type rollup.
///
/// Covers every placed instance of the type. 404 only when the type is
/// neither registered nor present in the layout.
pub async fn widget_type_handler(
    State(state): State<Arc<AppState>>,
    Path(widget_type_id): Path<String>,
) -> Result<Json<WidgetTypeDetail>, ApiError> {
    let descriptor = state.registry.descriptor(&widget_type_id);

    let instances: Vec<TypeInstance> = state
        .layout
        .items()
        .into_iter()
        .filter(|item| item.widget_type_id == widget_type_id)
        .map(|item| TypeInstance {
            snapshot: state.hub.snapshot(&item.instance_id),
            export: state.lifecycle.export(&item.instance_id),
            instance_id: item.instance_id,
            config: item.config,
        })
        .collect();

    if descriptor.is_none() && instances.is_empty() {
        return Err(ApiError::not_found(&format!(
            "Widget type {:?} is not registered and has no placed instances",
            widget_type_id
        )));
    }

    let has_secrets = state
        .secrets
        .as_ref()
        .map(|s| s.has_secrets(&widget_type_id))
        .unwrap_or(false);

    Ok(Json(WidgetTypeDetail {
        widget_type_id,
        descriptor,
        has_secrets,
        instances,
    }))
}
