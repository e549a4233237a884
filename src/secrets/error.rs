use thiserror::Error;

/// Errors raised by the secret store.
///
/// Validation variants map to client errors at the API layer; the rest are
/// server-side failures. Read-path decrypt errors never surface here, they
/// degrade the store to empty instead.
#[derive(Debug, Error)]
pub enum SecretsError {
    #[error("master key must be at least {0} characters")]
    WeakMasterKey(usize),

    #[error("widget type id must not be empty")]
    EmptyWidgetId,

    #[error("secrets must be a JSON object")]
    NotAnObject,

    #[error("invalid secrets: {0}")]
    SchemaViolation(String),

    #[error("failed to encrypt secrets: {0}")]
    Encrypt(String),

    #[error("failed to serialize secrets: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to persist secrets to {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to prepare secrets directory {path}: {source}")]
    Storage {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
