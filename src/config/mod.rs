//! Host configuration.
//!
//! Settings come from three layers. A TOML file supplies the base values,
//! `TESSERA_*` environment variables override the file, and CLI flags win
//! over both (the callers in [`crate::cli`] apply those last). Anything
//! left unset falls back to the defaults baked into each section struct.
//!
//! # Example
//!
//! ```rust
//! use tessera::config::HostConfig;
//!
//! let config: HostConfig = toml::from_str("[server]\nport = 9000").unwrap();
//! assert_eq!(config.server.port, 9000);
//! assert_eq!(config.server.host, "0.0.0.0");
//! ```

pub mod broadcast;
pub mod error;
pub mod logging;
pub mod secrets;
pub mod server;
pub mod storage;

pub use broadcast::BroadcastConfig;
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use secrets::{SecretsConfig, DEFAULT_MASTER_KEY_ENV};
pub use server::ServerConfig;
pub use storage::StorageConfig;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::secrets::StorageMode;

/// Top-level configuration for the host process.
///
/// Every section has usable defaults, so an empty file (or no file at all)
/// still yields a runnable configuration.
///
/// ```rust
/// use tessera::config::HostConfig;
///
/// let config = HostConfig::default();
/// assert_eq!(config.server.port, 8080);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HostConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// On-disk storage paths
    pub storage: StorageConfig,
    /// Secret store mode and master key source
    pub secrets: SecretsConfig,
    /// Log level and output format
    pub logging: LoggingConfig,
    /// Event fan-out configuration
    pub broadcast: BroadcastConfig,
}

impl HostConfig {
    /// Read configuration from a TOML file.
    ///
    /// With no path the defaults are returned untouched. A path that does
    /// not exist is reported as [`ConfigError::NotFound`] rather than
    /// treated as an empty file.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(p) = path else {
            return Ok(Self::default());
        };
        if !p.exists() {
            return Err(ConfigError::NotFound(p.to_path_buf()));
        }
        let raw = std::fs::read_to_string(p).map_err(|source| ConfigError::Read {
            path: p.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Fold `TESSERA_*` environment variables into the configuration.
    ///
    /// Recognised variables: `TESSERA_PORT`, `TESSERA_HOST`,
    /// `TESSERA_DATA_DIR`, `TESSERA_SECRETS_MODE`, `TESSERA_LOG_LEVEL` and
    /// `TESSERA_LOG_FORMAT`. A variable that is set but does not parse
    /// leaves the current value in place.
    pub fn with_env_overrides(mut self) -> Self {
        let env = |name: &str| std::env::var(name).ok();

        if let Some(port) = env("TESSERA_PORT").and_then(|v| v.parse().ok()) {
            self.server.port = port;
        }
        if let Some(host) = env("TESSERA_HOST") {
            self.server.host = host;
        }
        if let Some(dir) = env("TESSERA_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(mode) = env("TESSERA_SECRETS_MODE").and_then(|v| v.parse().ok()) {
            self.secrets.mode = mode;
        }
        if let Some(level) = env("TESSERA_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = env("TESSERA_LOG_FORMAT").and_then(|v| v.parse().ok()) {
            self.logging.format = format;
        }

        self
    }

    /// Path of the layout file under the data directory.
    pub fn layout_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.layout_file)
    }

    /// Path of the secrets file under the data directory.
    ///
    /// Falls back to a mode-specific file name when none is configured.
    pub fn secrets_path(&self) -> PathBuf {
        let file = match &self.storage.secrets_file {
            Some(name) => name.as_str(),
            None => match self.secrets.mode {
                StorageMode::Encrypted => "secrets.enc",
                StorageMode::Plain => "secrets.json",
            },
        };
        self.storage.data_dir.join(file)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn bad(field: &str, message: &str) -> ConfigError {
            ConfigError::Validation {
                field: field.to_string(),
                message: message.to_string(),
            }
        }

        if self.server.port == 0 {
            return Err(bad("server.port", "port must be non-zero"));
        }
        if self.storage.layout_file.trim().is_empty() {
            return Err(bad("storage.layout_file", "file name cannot be empty"));
        }
        if self
            .storage
            .secrets_file
            .as_ref()
            .is_some_and(|f| f.trim().is_empty())
        {
            return Err(bad("storage.secrets_file", "file name cannot be empty"));
        }
        if self.secrets.master_key_env.trim().is_empty() {
            return Err(bad(
                "secrets.master_key_env",
                "environment variable name cannot be empty",
            ));
        }
        if self.broadcast.capacity == 0 {
            return Err(bad("broadcast.capacity", "capacity must be non-zero"));
        }

        Ok(())
    }
}
