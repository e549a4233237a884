//! Secret store configuration

use serde::{Deserialize, Serialize};

use crate::secrets::StorageMode;

/// Default environment variable consulted for the master key.
pub const DEFAULT_MASTER_KEY_ENV: &str = "TESSERA_MASTER_KEY";

/// Secret store configuration.
///
/// The master key itself never appears in the config file; only the name of
/// the environment variable that carries it does.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretsConfig {
    pub mode: StorageMode,
    pub master_key_env: String,
}

impl Default for SecretsConfig {
    fn default() -> Self {
        Self {
            mode: StorageMode::Encrypted,
            master_key_env: DEFAULT_MASTER_KEY_ENV.to_string(),
        }
    }
}
