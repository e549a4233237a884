/// Errors that can occur during widget registration
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("widget type already registered: {0}")]
    DuplicateWidget(String),

    #[error("widget descriptor has an empty id")]
    EmptyId,
}
