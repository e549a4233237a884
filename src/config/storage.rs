//! Storage paths configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// On-disk storage configuration.
///
/// All files live under `data_dir`. The secrets file name is optional;
/// when omitted it is derived from the secrets mode (`secrets.enc` for
/// encrypted, `secrets.json` for plain).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub layout_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secrets_file: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            layout_file: "layout.json".to_string(),
            secrets_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_defaults() {
        let config = StorageConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.layout_file, "layout.json");
        assert!(config.secrets_file.is_none());
    }
}
