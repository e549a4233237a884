//! Error envelope shared by every admin and dashboard endpoint.
//!
//! All error responses carry the same JSON shape:
//! `{"error": {"message", "type", "code", "details"}}`. Store errors map onto
//! it through the `From` impls; validation problems become 400s, everything
//! else a 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::layout::LayoutError;
use crate::secrets::SecretsError;

/// API error response envelope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

/// Error details.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorBody {
    pub message: String,
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Structured context such as missing schema fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ApiError {
    /// Create a bad request error (400).
    pub fn bad_request(message: &str) -> Self {
        Self {
            error: ApiErrorBody {
                message: message.to_string(),
                r#type: "invalid_request_error".to_string(),
                code: Some("invalid_request_error".to_string()),
                details: None,
            },
        }
    }

    /// Create a not found error (404).
    pub fn not_found(message: &str) -> Self {
        Self {
            error: ApiErrorBody {
                message: message.to_string(),
                r#type: "invalid_request_error".to_string(),
                code: Some("not_found".to_string()),
                details: None,
            },
        }
    }

    /// Create a service unavailable error (503).
    pub fn service_unavailable(message: &str) -> Self {
        Self {
            error: ApiErrorBody {
                message: message.to_string(),
                r#type: "server_error".to_string(),
                code: Some("service_unavailable".to_string()),
                details: None,
            },
        }
    }

    /// Create an internal server error (500).
    pub fn internal(message: &str) -> Self {
        Self {
            error: ApiErrorBody {
                message: message.to_string(),
                r#type: "server_error".to_string(),
                code: Some("internal_error".to_string()),
                details: None,
            },
        }
    }

    /// Attach structured context to the error body.
    pub fn with_details(mut self, details: Value) -> Self {
        self.error.details = Some(details);
        self
    }

    /// Get the HTTP status code for this error.
    fn status_code(&self) -> StatusCode {
        match self.error.code.as_deref() {
            Some("invalid_request_error") => StatusCode::BAD_REQUEST,
            Some("not_found") => StatusCode::NOT_FOUND,
            Some("service_unavailable") => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SecretsError> for ApiError {
    fn from(err: SecretsError) -> Self {
        match err {
            SecretsError::WeakMasterKey(_)
            | SecretsError::EmptyWidgetId
            | SecretsError::NotAnObject
            | SecretsError::SchemaViolation(_) => ApiError::bad_request(&err.to_string()),
            SecretsError::Encrypt(_)
            | SecretsError::Serialize(_)
            | SecretsError::Persist { .. }
            | SecretsError::Storage { .. } => ApiError::internal(&err.to_string()),
        }
    }
}

impl From<LayoutError> for ApiError {
    fn from(err: LayoutError) -> Self {
        if err.is_validation() {
            ApiError::bad_request(&err.to_string())
        } else {
            ApiError::internal(&err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_error_serialize_400() {
        let error = ApiError::bad_request("Invalid JSON");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["error"]["code"], "invalid_request_error");
        assert_eq!(json["error"]["message"], "Invalid JSON");
        // Absent details never serialize as null
        assert!(json["error"].get("details").is_none());
    }

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(
            ApiError::bad_request("x").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::not_found("x").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::service_unavailable("x").into_response().status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::internal("x").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_with_details_serializes_context() {
        let error = ApiError::bad_request("invalid secrets")
            .with_details(json!({"missing": ["apiKey"]}));
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["error"]["details"]["missing"][0], "apiKey");
    }

    #[test]
    fn test_secrets_validation_error_maps_to_400() {
        let error: ApiError = SecretsError::NotAnObject.into();
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_secrets_storage_error_maps_to_500() {
        let error: ApiError = SecretsError::Encrypt("bad nonce".to_string()).into();
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_layout_validation_error_maps_to_400() {
        let error: ApiError = LayoutError::DuplicateInstance("abc".to_string()).into();
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_api_error_unknown_code_returns_500() {
        let error = ApiError {
            error: ApiErrorBody {
                message: "Unknown".to_string(),
                r#type: "server_error".to_string(),
                code: Some("unknown_code".to_string()),
                details: None,
            },
        };
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
