//! Layout read and replace endpoints.

use crate::api::{ApiError, AppState};
use crate::layout::LayoutItem;
use crate::lifecycle::ReconcileSummary;
use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Response for POST /layout: the normalized items plus what the
/// reconciliation pass did about them.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveLayoutResponse {
    pub items: Vec<LayoutItem>,
    pub reconcile: ReconcileSummary,
}

/// GET /layout - The persisted grid as a JSON array.
pub async fn get_handler(State(state): State<Arc<AppState>>) -> Json<Vec<LayoutItem>> {
    Json(state.layout.items())
}

/// POST /layout - Replace the whole layout.
///
/// The body must be a JSON array of layout items. Instances without an id
/// get one assigned; the running backend set is reconciled against the new
/// layout before responding. Malformed bodies return 400 with the standard
/// error envelope, never a bare 422.
pub async fn save_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SaveLayoutResponse>, ApiError> {
    let Json(body) =
        body.map_err(|e| ApiError::bad_request(&format!("invalid JSON body: {}", e)))?;

    let items: Vec<LayoutItem> = serde_json::from_value(body)
        .map_err(|e| ApiError::bad_request(&format!("layout must be an array of items: {}", e)))?;

    let items = state.layout.replace(items)?;
    let reconcile = state.lifecycle.reconcile(&items);

    Ok(Json(SaveLayoutResponse { items, reconcile }))
}
