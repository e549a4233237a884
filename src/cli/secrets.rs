//! Secrets command implementations
//!
//! All read paths print the masked view only. Plaintext secret values exist
//! in process memory while a command runs and are never written to stdout or
//! the log.

use crate::cli::output::{format_masked_table, format_secrets_json, format_secrets_table, SecretsBucketView};
use crate::cli::{SecretsDeleteArgs, SecretsListArgs, SecretsSetArgs, SecretsShowArgs};
use crate::config::HostConfig;
use crate::registry::WidgetRegistry;
use crate::secrets::{SecretStore, StorageMode, MIN_MASTER_KEY_LEN};
use serde_json::{json, Map, Value};

/// Open the store for a CLI command.
///
/// Unlike the server, which degrades to 503 responses when the store cannot
/// be opened, a CLI command that exists to touch secrets fails outright.
pub fn open_cli_store(config: &HostConfig) -> Result<SecretStore, Box<dyn std::error::Error>> {
    let path = config.secrets_path();

    let store = match config.secrets.mode {
        StorageMode::Encrypted => {
            let master_key = std::env::var(&config.secrets.master_key_env).map_err(|_| {
                format!(
                    "secrets mode is \"encrypted\" but {} is not set; export a master key of at \
                     least {} characters, or switch to plain mode for development",
                    config.secrets.master_key_env, MIN_MASTER_KEY_LEN
                )
            })?;
            SecretStore::open_encrypted(&path, &master_key)?
        }
        StorageMode::Plain => SecretStore::open_plain(&path)?,
    };

    Ok(store)
}

/// Parse `key=value` pairs into a secrets bucket.
///
/// Values that parse as a JSON number or boolean are stored typed; everything
/// else is stored as a string, so `retries=3` and `region=eu-west` both do
/// what they look like.
pub fn parse_fields(pairs: &[String]) -> Result<Value, Box<dyn std::error::Error>> {
    let mut bucket = Map::new();

    for pair in pairs {
        let Some((key, raw)) = pair.split_once('=') else {
            return Err(format!("Invalid field '{}'. Use: key=value", pair).into());
        };
        if key.trim().is_empty() {
            return Err(format!("Invalid field '{}'. Field name is empty", pair).into());
        }

        let value = match serde_json::from_str::<Value>(raw) {
            Ok(v @ Value::Number(_)) | Ok(v @ Value::Bool(_)) => v,
            _ => Value::String(raw.to_string()),
        };
        bucket.insert(key.trim().to_string(), value);
    }

    Ok(Value::Object(bucket))
}

/// Handle `tessera secrets list` command
pub fn handle_secrets_list(
    args: &SecretsListArgs,
    store: &SecretStore,
    registry: &WidgetRegistry,
) -> Result<String, Box<dyn std::error::Error>> {
    let views: Vec<SecretsBucketView> = store
        .list()
        .into_iter()
        .map(|widget_id| {
            let fields = store
                .masked(&widget_id)
                .as_object()
                .map(|b| b.len())
                .unwrap_or(0);
            let known_type = registry.descriptor(&widget_id).is_some();
            SecretsBucketView {
                widget_id,
                fields,
                known_type,
            }
        })
        .collect();

    if args.json {
        Ok(format_secrets_json(&views))
    } else {
        Ok(format_secrets_table(&views))
    }
}

/// Handle `tessera secrets show` command
pub fn handle_secrets_show(
    args: &SecretsShowArgs,
    store: &SecretStore,
) -> Result<String, Box<dyn std::error::Error>> {
    if !store.has_secrets(&args.widget) {
        return Ok(format!("No secrets stored for '{}'", args.widget));
    }

    let masked = store.masked(&args.widget);

    if args.json {
        Ok(serde_json::to_string_pretty(&json!({
            "widgetId": args.widget,
            "secrets": masked
        }))?)
    } else {
        Ok(format_masked_table(&args.widget, &masked))
    }
}

/// Handle `tessera secrets set` command
pub fn handle_secrets_set(
    args: &SecretsSetArgs,
    store: &SecretStore,
    registry: &WidgetRegistry,
) -> Result<String, Box<dyn std::error::Error>> {
    let bucket = parse_fields(&args.fields)?;
    let field_count = bucket.as_object().map(|b| b.len()).unwrap_or(0);

    store.set(&args.widget, bucket)?;

    let mut output = format!(
        "Stored {} secret field(s) for '{}'",
        field_count, args.widget
    );

    // Advisory schema check, field names only
    if let Some(schema) = registry
        .descriptor(&args.widget)
        .and_then(|d| d.secrets_schema)
    {
        let validation = store.validate(&args.widget, &schema);
        if !validation.valid {
            let mut problems = Vec::new();
            if !validation.missing.is_empty() {
                problems.push(format!("missing: {}", validation.missing.join(", ")));
            }
            problems.extend(validation.errors);
            output.push_str(&format!(
                "\nWarning: bucket does not satisfy the declared schema ({})",
                problems.join("; ")
            ));
        }
    }

    output.push_str("\nRestart the host or save the layout to apply the change.");
    Ok(output)
}

/// Handle `tessera secrets delete` command
pub fn handle_secrets_delete(
    args: &SecretsDeleteArgs,
    store: &SecretStore,
) -> Result<String, Box<dyn std::error::Error>> {
    if store.delete(&args.widget)? {
        Ok(format!("Deleted secrets for '{}'", args.widget))
    } else {
        Ok(format!("No secrets stored for '{}'", args.widget))
    }
}
