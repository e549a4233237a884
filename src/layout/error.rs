use thiserror::Error;

/// Errors from layout validation and persistence.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout item {index} is missing a widget type id")]
    MissingWidgetType { index: usize },

    #[error("duplicate instance id {0:?} in layout")]
    DuplicateInstance(String),

    #[error("config for instance {instance:?} must be a JSON object")]
    InvalidConfig { instance: String },

    #[error("failed to serialize layout: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to persist layout to {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to prepare layout directory {path}: {source}")]
    Storage {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl LayoutError {
    /// Whether this error is the caller's fault (maps to a 4xx response).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LayoutError::MissingWidgetType { .. }
                | LayoutError::DuplicateInstance(_)
                | LayoutError::InvalidConfig { .. }
        )
    }
}
