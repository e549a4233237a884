//! Secret management endpoints.
//!
//! Stored values never leave these handlers unmasked: reads return the
//! redacted view, writes echo the redacted view, and log lines carry field
//! counts only.

use crate::api::{ApiError, AppState};
use crate::secrets::{SchemaValidation, SecretStore};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Response for GET /secrets.
#[derive(Debug, Serialize)]
pub struct SecretsListResponse {
    /// Widget type ids with a non-empty stored bucket
    pub widgets: Vec<String>,
}

/// Masked view of one widget type's bucket.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretsView {
    pub widget_id: String,
    pub secrets: Value,
    pub has_secrets: bool,
}

/// Response for POST /widgets/{id}/secrets.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSecretsResponse {
    pub widget_id: String,
    pub secrets: Value,
    pub has_secrets: bool,
    /// Backends of this type restarted to pick up the new bucket
    pub restarted: usize,
    /// Advisory schema check, present when the type declares a schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<SchemaValidation>,
}

/// Response for DELETE /widgets/{id}/secrets.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSecretsResponse {
    pub widget_id: String,
    pub deleted: bool,
    pub restarted: usize,
}

fn store_of(state: &AppState) -> Result<&Arc<SecretStore>, ApiError> {
    state.secrets.as_ref().ok_or_else(|| {
        ApiError::service_unavailable("secret store unavailable, check the master key configuration")
    })
}

/// GET /secrets - Widget types that have stored secrets.
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SecretsListResponse>, ApiError> {
    let store = store_of(&state)?;
    Ok(Json(SecretsListResponse {
        widgets: store.list(),
    }))
}

/// GET /widgets/{id}/secrets - Masked view of one bucket.
///
/// Unknown types are not an error; their bucket is simply empty. The bucket
/// keyspace is open so secrets can be staged before a plugin is installed.
pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    Path(widget_type_id): Path<String>,
) -> Result<Json<SecretsView>, ApiError> {
    let store = store_of(&state)?;

    Ok(Json(SecretsView {
        secrets: store.masked(&widget_type_id),
        has_secrets: store.has_secrets(&widget_type_id),
        widget_id: widget_type_id,
    }))
}

/// POST /widgets/{id}/secrets - Replace one bucket wholesale.
///
/// The body must be a JSON object of field name to value. Running backends
/// of the type are restarted so they re-read their bucket. When the type
/// declares a secrets schema the stored bucket is checked against it and the
/// result attached as advisory context; a failing check does not reject the
/// write.
pub async fn store_handler(
    State(state): State<Arc<AppState>>,
    Path(widget_type_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<StoreSecretsResponse>, ApiError> {
    let store = store_of(&state)?;
    let Json(body) =
        body.map_err(|e| ApiError::bad_request(&format!("invalid JSON body: {}", e)))?;

    let field_count = body.as_object().map(|o| o.len()).unwrap_or(0);
    store.set(&widget_type_id, body)?;

    let validation = state
        .registry
        .descriptor(&widget_type_id)
        .and_then(|desc| desc.secrets_schema)
        .map(|schema| store.validate(&widget_type_id, &schema));

    let restarted = state.lifecycle.restart_type(&widget_type_id);

    tracing::info!(
        target: "tessera::audit",
        widget = %widget_type_id,
        fields = field_count,
        restarted,
        "Secrets replaced"
    );

    Ok(Json(StoreSecretsResponse {
        secrets: store.masked(&widget_type_id),
        has_secrets: store.has_secrets(&widget_type_id),
        widget_id: widget_type_id,
        restarted,
        validation,
    }))
}

/// DELETE /widgets/{id}/secrets - Remove one bucket.
///
/// Deleting an absent bucket reports `deleted: false` and restarts nothing.
pub async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(widget_type_id): Path<String>,
) -> Result<Json<DeleteSecretsResponse>, ApiError> {
    let store = store_of(&state)?;

    let deleted = store.delete(&widget_type_id)?;
    let restarted = if deleted {
        state.lifecycle.restart_type(&widget_type_id)
    } else {
        0
    };

    if deleted {
        tracing::info!(
            target: "tessera::audit",
            widget = %widget_type_id,
            restarted,
            "Secrets deleted"
        );
    }

    Ok(Json(DeleteSecretsResponse {
        widget_id: widget_type_id,
        deleted,
        restarted,
    }))
}
