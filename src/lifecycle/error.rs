use thiserror::Error;

/// Errors a widget factory can report when asked to start a backend.
///
/// A failed init is logged and skipped; it never aborts the surrounding
/// reconciliation pass.
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("invalid widget config: {0}")]
    InvalidConfig(String),

    #[error("widget backend failed to start: {0}")]
    Init(String),
}
