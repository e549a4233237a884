use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading or validating the host configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(String),

    #[error("invalid value for '{field}': {message}")]
    Validation { field: String, message: String },
}
