//! Widget type listing endpoint.

use crate::api::AppState;
use crate::registry::WidgetTypeDescriptor;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

/// One entry in the widget listing: the descriptor plus host-side state.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetListEntry {
    #[serde(flatten)]
    pub descriptor: WidgetTypeDescriptor,
    pub has_secrets: bool,
    pub active_instances: usize,
}

/// Response for GET /widgets.
#[derive(Debug, Serialize)]
pub struct WidgetListResponse {
    pub widgets: Vec<WidgetListEntry>,
}

/// GET /widgets - List registered widget type descriptors.
///
/// Ordered by id. `hasSecrets` reports bucket existence only; stored values
/// never appear in this response.
pub async fn list_handler(State(state): State<Arc<AppState>>) -> Json<WidgetListResponse> {
    let active = state.lifecycle.active_instances();

    let widgets = state
        .registry
        .descriptors()
        .into_iter()
        .map(|descriptor| {
            let has_secrets = state
                .secrets
                .as_ref()
                .map(|s| s.has_secrets(&descriptor.id))
                .unwrap_or(false);
            let active_instances = active
                .iter()
                .filter(|(_, ty)| ty == &descriptor.id)
                .count();

            WidgetListEntry {
                descriptor,
                has_secrets,
                active_instances,
            }
        })
        .collect();

    Json(WidgetListResponse { widgets })
}
