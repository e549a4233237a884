//! Type-scoped secret storage.
//!
//! Secrets live in one bucket per widget type id, never per instance, so
//! every instance of a widget shares credentials. The whole bucket map is
//! persisted as a single artifact: AES-256-GCM sealed in encrypted mode, a
//! human-editable JSON file in plain mode. Read failures degrade to an empty
//! store so the host still starts and an operator can re-enter secrets;
//! write failures always surface to the caller.

mod crypto;
mod error;

pub use error::SecretsError;

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::registry::FieldSchema;

/// Minimum master key length accepted in encrypted mode.
pub const MIN_MASTER_KEY_LEN: usize = 16;

type Buckets = HashMap<String, Map<String, Value>>;

/// How buckets are persisted. Fixed at construction for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    #[default]
    Encrypted,
    Plain,
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageMode::Encrypted => write!(f, "encrypted"),
            StorageMode::Plain => write!(f, "plain"),
        }
    }
}

impl std::str::FromStr for StorageMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "encrypted" => Ok(StorageMode::Encrypted),
            "plain" => Ok(StorageMode::Plain),
            _ => Err(format!("Invalid secrets mode: {}", s)),
        }
    }
}

enum ModeState {
    Encrypted { master_key: String },
    Plain,
}

/// Result of checking a bucket against a widget's declared secrets schema.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaValidation {
    pub valid: bool,
    /// Required fields that are absent, null, or an empty string
    pub missing: Vec<String>,
    /// Type and option violations for fields that are present
    pub errors: Vec<String>,
}

/// Secret store shared across the API surface and the lifecycle manager.
pub struct SecretStore {
    path: PathBuf,
    state: ModeState,
    buckets: RwLock<Buckets>,
}

impl SecretStore {
    /// Open an encrypted store backed by `path`.
    ///
    /// A short master key is refused outright; an unreadable or undecryptable
    /// file is logged and treated as empty.
    pub fn open_encrypted(path: &Path, master_key: &str) -> Result<Self, SecretsError> {
        if master_key.len() < MIN_MASTER_KEY_LEN {
            return Err(SecretsError::WeakMasterKey(MIN_MASTER_KEY_LEN));
        }
        prepare_parent(path)?;

        let buckets = match fs::read_to_string(path) {
            Ok(blob) => match crypto::open(master_key, &blob) {
                Ok(plaintext) => parse_buckets(path, &plaintext),
                Err(reason) => {
                    tracing::error!(
                        path = %path.display(),
                        %reason,
                        "Failed to decrypt secret store, starting empty"
                    );
                    Buckets::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Buckets::new(),
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read secret store, starting empty"
                );
                Buckets::new()
            }
        };

        tracing::info!(
            path = %path.display(),
            widgets = buckets.len(),
            "Secret store ready (encrypted)"
        );

        Ok(Self {
            path: path.to_path_buf(),
            state: ModeState::Encrypted {
                master_key: master_key.to_string(),
            },
            buckets: RwLock::new(buckets),
        })
    }

    /// Open a plain-text store backed by `path`. Development only.
    pub fn open_plain(path: &Path) -> Result<Self, SecretsError> {
        prepare_parent(path)?;

        let buckets = match fs::read_to_string(path) {
            Ok(raw) => parse_buckets(path, raw.as_bytes()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Buckets::new(),
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read secret store, starting empty"
                );
                Buckets::new()
            }
        };

        tracing::warn!(
            path = %path.display(),
            "Secret store running in PLAIN mode, secrets are persisted unencrypted"
        );

        Ok(Self {
            path: path.to_path_buf(),
            state: ModeState::Plain,
            buckets: RwLock::new(buckets),
        })
    }

    pub fn mode(&self) -> StorageMode {
        match self.state {
            ModeState::Encrypted { .. } => StorageMode::Encrypted,
            ModeState::Plain => StorageMode::Plain,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored bucket for a widget type, `{}` when none exists.
    pub fn bucket(&self, widget_type_id: &str) -> Value {
        let buckets = self.buckets.read().unwrap();
        match buckets.get(widget_type_id) {
            Some(bucket) => Value::Object(bucket.clone()),
            None => Value::Object(Map::new()),
        }
    }

    /// Masked view of a bucket: same keys, string values redacted.
    pub fn masked(&self, widget_type_id: &str) -> Value {
        let buckets = self.buckets.read().unwrap();
        let masked: Map<String, Value> = buckets
            .get(widget_type_id)
            .map(|bucket| {
                bucket
                    .iter()
                    .map(|(k, v)| (k.clone(), mask_value(v)))
                    .collect()
            })
            .unwrap_or_default();
        Value::Object(masked)
    }

    /// Whether a widget type has a non-empty bucket.
    pub fn has_secrets(&self, widget_type_id: &str) -> bool {
        let buckets = self.buckets.read().unwrap();
        buckets.get(widget_type_id).is_some_and(|b| !b.is_empty())
    }

    /// Widget type ids with a non-empty bucket, sorted.
    pub fn list(&self) -> Vec<String> {
        let buckets = self.buckets.read().unwrap();
        let mut ids: Vec<String> = buckets
            .iter()
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Replace a widget type's bucket and persist immediately.
    ///
    /// On a persist failure the in-memory bucket is rolled back so memory
    /// never claims a state the disk does not hold.
    pub fn set(&self, widget_type_id: &str, bucket: Value) -> Result<(), SecretsError> {
        if widget_type_id.trim().is_empty() {
            return Err(SecretsError::EmptyWidgetId);
        }
        let Value::Object(incoming) = bucket else {
            return Err(SecretsError::NotAnObject);
        };

        let mut buckets = self.buckets.write().unwrap();
        let previous = buckets.insert(widget_type_id.to_string(), incoming);

        if let Err(e) = self.persist(&buckets) {
            match previous {
                Some(old) => buckets.insert(widget_type_id.to_string(), old),
                None => buckets.remove(widget_type_id),
            };
            return Err(e);
        }

        metrics::counter!("tessera_secrets_writes_total").increment(1);
        tracing::info!(widget = %widget_type_id, "Secrets bucket replaced");
        Ok(())
    }

    /// Remove a widget type's bucket. Returns whether one existed; absent is
    /// a no-op that touches nothing on disk.
    pub fn delete(&self, widget_type_id: &str) -> Result<bool, SecretsError> {
        let mut buckets = self.buckets.write().unwrap();
        let Some(previous) = buckets.remove(widget_type_id) else {
            return Ok(false);
        };

        if let Err(e) = self.persist(&buckets) {
            buckets.insert(widget_type_id.to_string(), previous);
            return Err(e);
        }

        metrics::counter!("tessera_secrets_deletes_total").increment(1);
        tracing::info!(widget = %widget_type_id, "Secrets bucket deleted");
        Ok(true)
    }

    /// Validate the stored bucket for a widget type against a schema.
    pub fn validate(&self, widget_type_id: &str, schema: &FieldSchema) -> SchemaValidation {
        validate_bucket(&self.bucket(widget_type_id), schema)
    }

    fn persist(&self, buckets: &Buckets) -> Result<(), SecretsError> {
        let artifact = match &self.state {
            ModeState::Encrypted { master_key } => {
                let plaintext = serde_json::to_vec(buckets)?;
                crypto::seal(master_key, &plaintext)?
            }
            ModeState::Plain => serde_json::to_string_pretty(buckets)?,
        };

        let tmp = self.path.with_extension("tmp");
        let persist_err = |source| SecretsError::Persist {
            path: self.path.display().to_string(),
            source,
        };
        fs::write(&tmp, artifact).map_err(persist_err)?;
        fs::rename(&tmp, &self.path).map_err(persist_err)
    }
}

/// Check a bucket against a declared schema.
///
/// Required fields are missing when absent, null, or an empty string.
/// Present fields must match their declared primitive type and, for string
/// fields with `options`, be one of the declared values. Keys the schema
/// does not mention pass through untouched.
pub fn validate_bucket(bucket: &Value, schema: &FieldSchema) -> SchemaValidation {
    let empty = Map::new();
    let entries = bucket.as_object().unwrap_or(&empty);

    let mut missing = Vec::new();
    let mut errors = Vec::new();

    for (key, spec) in schema {
        let value = entries.get(key);
        let absent = match value {
            None => true,
            Some(Value::Null) => true,
            Some(Value::String(s)) => s.is_empty(),
            Some(_) => false,
        };

        if spec.required && absent {
            missing.push(key.clone());
            continue;
        }

        let Some(value) = value else { continue };
        if value.is_null() {
            continue;
        }

        if !spec.field_type.accepts(value) {
            errors.push(format!("{key} must be a {}", spec.field_type.label()));
            continue;
        }
        if let (Some(options), Some(s)) = (&spec.options, value.as_str()) {
            if !s.is_empty() && !options.iter().any(|o| o == s) {
                errors.push(format!("{key} must be one of: {}", options.join(", ")));
            }
        }
    }

    SchemaValidation {
        valid: missing.is_empty() && errors.is_empty(),
        missing,
        errors,
    }
}

/// Redact a secret string for display.
pub fn mask_secret(value: &str) -> String {
    let n = value.chars().count();
    match n {
        0 => String::new(),
        1..=8 => "***".to_string(),
        _ => {
            let head: String = value.chars().take(3).collect();
            let tail: String = value.chars().skip(n - 3).collect();
            format!("{head}***{tail}")
        }
    }
}

/// Redact a JSON value: strings are masked, everything else passes through.
pub fn mask_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(mask_secret(s)),
        other => other.clone(),
    }
}

fn prepare_parent(path: &Path) -> Result<(), SecretsError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| SecretsError::Storage {
                path: parent.display().to_string(),
                source,
            })?;
        }
    }
    Ok(())
}

fn parse_buckets(path: &Path, raw: &[u8]) -> Buckets {
    match serde_json::from_slice(raw) {
        Ok(buckets) => buckets,
        Err(e) => {
            tracing::error!(
                path = %path.display(),
                error = %e,
                "Secret store contents are corrupt, starting empty"
            );
            Buckets::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{FieldSpec, FieldType};
    use serde_json::json;
    use tempfile::tempdir;

    const KEY: &str = "a master key long enough";

    #[test]
    fn test_mask_rules() {
        assert_eq!(mask_secret(""), "");
        assert_eq!(mask_secret("a"), "***");
        assert_eq!(mask_secret("12345678"), "***");
        assert_eq!(mask_secret("123456789"), "123***789");
        assert_eq!(mask_secret("sk-livekey-abcdef"), "sk-***def");
    }

    #[test]
    fn test_mask_value_passes_non_strings() {
        assert_eq!(mask_value(&json!(42)), json!(42));
        assert_eq!(mask_value(&json!(true)), json!(true));
        assert_eq!(mask_value(&json!("longersecret")), json!("lon***ret"));
    }

    #[test]
    fn test_set_get_delete_round_trip() {
        let dir = tempdir().unwrap();
        let store = SecretStore::open_plain(&dir.path().join("secrets.json")).unwrap();

        assert_eq!(store.bucket("stocks-widget"), json!({}));

        store
            .set("stocks-widget", json!({"api_key": "sk-12345678901"}))
            .unwrap();
        assert_eq!(store.bucket("stocks-widget")["api_key"], "sk-12345678901");
        assert!(store.has_secrets("stocks-widget"));
        assert_eq!(store.list(), vec!["stocks-widget".to_string()]);

        assert!(store.delete("stocks-widget").unwrap());
        assert!(!store.delete("stocks-widget").unwrap());
        assert_eq!(store.bucket("stocks-widget"), json!({}));
    }

    #[test]
    fn test_set_rejects_non_objects_and_empty_ids() {
        let dir = tempdir().unwrap();
        let store = SecretStore::open_plain(&dir.path().join("secrets.json")).unwrap();

        assert!(matches!(
            store.set("stocks-widget", json!("just a string")),
            Err(SecretsError::NotAnObject)
        ));
        assert!(matches!(
            store.set("stocks-widget", json!([1, 2])),
            Err(SecretsError::NotAnObject)
        ));
        assert!(matches!(
            store.set("  ", json!({})),
            Err(SecretsError::EmptyWidgetId)
        ));
    }

    #[test]
    fn test_list_skips_empty_buckets() {
        let dir = tempdir().unwrap();
        let store = SecretStore::open_plain(&dir.path().join("secrets.json")).unwrap();

        store.set("a-widget", json!({})).unwrap();
        store.set("b-widget", json!({"k": "v"})).unwrap();

        assert_eq!(store.list(), vec!["b-widget".to_string()]);
        assert!(!store.has_secrets("a-widget"));
    }

    #[test]
    fn test_plain_mode_file_is_readable_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        let store = SecretStore::open_plain(&path).unwrap();
        store.set("a-widget", json!({"token": "t"})).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let parsed: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed["a-widget"]["token"], "t");
    }

    #[test]
    fn test_encrypted_mode_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("secrets.enc");

        let store = SecretStore::open_encrypted(&path, KEY).unwrap();
        store
            .set("weather-widget", json!({"api_key": "wk-998877665544"}))
            .unwrap();
        drop(store);

        let reopened = SecretStore::open_encrypted(&path, KEY).unwrap();
        assert_eq!(
            reopened.bucket("weather-widget")["api_key"],
            "wk-998877665544"
        );
    }

    #[test]
    fn test_encrypted_file_is_not_plaintext() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("secrets.enc");
        let store = SecretStore::open_encrypted(&path, KEY).unwrap();
        store
            .set("weather-widget", json!({"api_key": "super-secret-value"}))
            .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("super-secret-value"));
        assert!(!raw.contains("weather-widget"));
    }

    #[test]
    fn test_wrong_master_key_degrades_to_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("secrets.enc");

        let store = SecretStore::open_encrypted(&path, KEY).unwrap();
        store.set("a-widget", json!({"k": "v"})).unwrap();
        drop(store);

        let reopened =
            SecretStore::open_encrypted(&path, "a different key also long").unwrap();
        assert_eq!(reopened.list(), Vec::<String>::new());
    }

    #[test]
    fn test_short_master_key_is_refused() {
        let dir = tempdir().unwrap();
        let result = SecretStore::open_encrypted(&dir.path().join("secrets.enc"), "short");
        assert!(matches!(result, Err(SecretsError::WeakMasterKey(_))));
    }

    #[test]
    fn test_corrupt_plain_file_degrades_to_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("secrets.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = SecretStore::open_plain(&path).unwrap();
        assert_eq!(store.list(), Vec::<String>::new());
    }

    #[test]
    fn test_persist_failure_rolls_back_memory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sub").join("secrets.json");
        let store = SecretStore::open_plain(&path).unwrap();
        store.set("a-widget", json!({"k": "v"})).unwrap();

        // Make the target directory unwritable by replacing it with a file.
        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path.parent().unwrap(), "blocker").unwrap();

        let result = store.set("a-widget", json!({"k": "new"}));
        assert!(result.is_err());
        assert_eq!(store.bucket("a-widget")["k"], "v");
    }

    #[test]
    fn test_masked_view_redacts_strings() {
        let dir = tempdir().unwrap();
        let store = SecretStore::open_plain(&dir.path().join("secrets.json")).unwrap();
        store
            .set(
                "stocks-widget",
                json!({"api_key": "sk-1234567890", "retries": 3}),
            )
            .unwrap();

        let masked = store.masked("stocks-widget");
        assert_eq!(masked["api_key"], "sk-***890");
        assert_eq!(masked["retries"], 3);
    }

    #[test]
    fn test_validate_required_type_and_options() {
        let mut schema = FieldSchema::new();
        schema.insert("api_key".to_string(), FieldSpec::required(FieldType::String));
        schema.insert(
            "provider".to_string(),
            FieldSpec::optional(FieldType::String, json!("finnhub"))
                .with_options(&["finnhub", "alphavantage"]),
        );
        schema.insert(
            "retries".to_string(),
            FieldSpec::optional(FieldType::Number, json!(3)),
        );

        let ok = validate_bucket(
            &json!({"api_key": "sk-1", "provider": "finnhub", "retries": 5}),
            &schema,
        );
        assert!(ok.valid);

        let missing = validate_bucket(&json!({"provider": "finnhub"}), &schema);
        assert!(!missing.valid);
        assert_eq!(missing.missing, vec!["api_key".to_string()]);

        let empty_required = validate_bucket(&json!({"api_key": ""}), &schema);
        assert!(!empty_required.valid);
        assert_eq!(empty_required.missing, vec!["api_key".to_string()]);

        let bad_type = validate_bucket(&json!({"api_key": "k", "retries": "three"}), &schema);
        assert!(!bad_type.valid);
        assert_eq!(bad_type.errors, vec!["retries must be a number".to_string()]);

        let bad_option = validate_bucket(&json!({"api_key": "k", "provider": "yahoo"}), &schema);
        assert!(!bad_option.valid);
        assert_eq!(
            bad_option.errors,
            vec!["provider must be one of: finnhub, alphavantage".to_string()]
        );
    }
}
