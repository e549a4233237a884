//! The `serve` command: configuration merge, store setup and the HTTP
//! server loop.

use crate::api::{create_router, AppState};
use crate::cli::ServeArgs;
use crate::config::{HostConfig, LogFormat};
use crate::layout::LayoutStore;
use crate::registry::WidgetRegistry;
use crate::secrets::{SecretStore, SecretsError, StorageMode, MIN_MASTER_KEY_LEN};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Merge file, environment and CLI flag configuration for `serve`.
///
/// A missing config file is not an error here; the host runs fine on
/// defaults. Flags passed on the command line win over everything else.
pub fn load_config_with_overrides(
    args: &ServeArgs,
) -> Result<HostConfig, Box<dyn std::error::Error>> {
    let file = args.config.exists().then_some(args.config.as_path());
    if file.is_none() {
        tracing::debug!(path = %args.config.display(), "No config file, starting from defaults");
    }
    let mut config = HostConfig::load(file)?.with_env_overrides();

    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host.as_deref() {
        config.server.host = host.to_string();
    }
    if let Some(data_dir) = args.data_dir.as_deref() {
        config.storage.data_dir = data_dir.to_path_buf();
    }
    if let Some(level) = args.log_level.as_deref() {
        config.logging.level = level.to_string();
    }
    if args.plain_secrets {
        config.secrets.mode = StorageMode::Plain;
    }

    Ok(config)
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_tracing(
    config: &crate::config::LoggingConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let directives = crate::logging::build_filter_directives(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    let fmt_layer = match config.format {
        LogFormat::Pretty => tracing_subscriber::fmt::layer().pretty().boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer().json().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Open the secret store named by the configuration.
///
/// Encrypted mode reads the master key from the configured environment
/// variable; a missing or too-short key refuses startup. Storage problems
/// degrade to `None` so the host still serves everything except the secrets
/// endpoints.
pub fn open_secret_store(
    config: &HostConfig,
) -> Result<Option<SecretStore>, Box<dyn std::error::Error>> {
    let path = config.secrets_path();

    let opened = match config.secrets.mode {
        StorageMode::Encrypted => {
            let master_key = std::env::var(&config.secrets.master_key_env).map_err(|_| {
                format!(
                    "secrets mode is \"encrypted\" but {} is not set; export a master key of at \
                     least {} characters, or switch to plain mode for development",
                    config.secrets.master_key_env, MIN_MASTER_KEY_LEN
                )
            })?;
            SecretStore::open_encrypted(&path, &master_key)
        }
        StorageMode::Plain => {
            tracing::warn!(
                path = %path.display(),
                "Secrets are stored as plain JSON, do not use this mode in production"
            );
            SecretStore::open_plain(&path)
        }
    };

    match opened {
        Ok(store) => Ok(Some(store)),
        Err(e @ SecretsError::WeakMasterKey(_)) => Err(e.into()),
        Err(e) => {
            tracing::error!(
                error = %e,
                "Secret store unavailable, secrets endpoints will return 503"
            );
            Ok(None)
        }
    }
}

/// Resolve when SIGINT or SIGTERM arrives, then cancel background work.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }

    cancel.cancel();
}

/// Run the host until a shutdown signal arrives.
pub async fn run_serve(args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    // 1. Merge and check configuration
    let config = load_config_with_overrides(&args)?;
    config.validate()?;

    // 2. Logging before anything that can fail loudly
    init_tracing(&config.logging)?;

    tracing::info!("Starting Tessera host");
    tracing::debug!(?config, "Effective configuration");

    // 3. Builtin widgets plus the persisted stores
    let registry = Arc::new(WidgetRegistry::with_builtins());
    let layout = Arc::new(LayoutStore::open(&config.layout_path())?);
    let secrets = open_secret_store(&config)?.map(Arc::new);

    // 4. Shared state and the route table
    let config = Arc::new(config);
    let state = Arc::new(AppState::new(
        Arc::clone(&config),
        registry,
        Arc::clone(&layout),
        secrets,
    ));
    let app = create_router(Arc::clone(&state));

    // 5. Bring up backends for whatever layout survived the last run
    let summary = state.lifecycle.reconcile(&layout.items());
    tracing::info!(
        started = summary.started.len(),
        skipped = summary.skipped.len(),
        "Initial reconciliation complete"
    );

    // 6. Serve until a signal arrives
    let addr = config.server.bind_addr();
    tracing::info!(addr = %addr, "Tessera host listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let cancel_token = CancellationToken::new();
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel_token.clone()))
        .await?;

    // 7. Teardown for every running backend before exit
    state.lifecycle.stop_all();

    tracing::info!("Tessera host stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    fn serve_args(config: PathBuf) -> ServeArgs {
        ServeArgs {
            config,
            port: None,
            host: None,
            data_dir: None,
            log_level: None,
            plain_secrets: false,
        }
    }

    fn config_file(contents: &str) -> NamedTempFile {
        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), contents).unwrap();
        temp
    }

    #[tokio::test]
    async fn test_config_file_is_read() {
        let temp = config_file("[server]\nport = 8090");
        let config = load_config_with_overrides(&serve_args(temp.path().to_path_buf())).unwrap();
        assert_eq!(config.server.port, 8090);
    }

    #[tokio::test]
    async fn test_cli_flag_beats_config_file() {
        let temp = config_file("[server]\nport = 8090");
        let mut args = serve_args(temp.path().to_path_buf());
        args.port = Some(9000);

        let config = load_config_with_overrides(&args).unwrap();
        assert_eq!(config.server.port, 9000);
    }

    #[tokio::test]
    async fn test_missing_config_file_uses_defaults() {
        let config = load_config_with_overrides(&serve_args(PathBuf::from("nonexistent.toml")))
            .unwrap();
        assert_eq!(config.server.port, 8080);
    }

    #[tokio::test]
    async fn test_plain_secrets_flag_switches_mode() {
        let mut args = serve_args(PathBuf::from("nonexistent.toml"));
        args.plain_secrets = true;

        let config = load_config_with_overrides(&args).unwrap();
        assert_eq!(config.secrets.mode, StorageMode::Plain);
    }

    #[test]
    fn test_open_secret_store_plain_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = HostConfig::default();
        config.storage.data_dir = dir.path().to_path_buf();
        config.secrets.mode = StorageMode::Plain;

        let store = open_secret_store(&config).unwrap();
        assert!(store.is_some());
    }

    #[test]
    fn test_open_secret_store_missing_master_key_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = HostConfig::default();
        config.storage.data_dir = dir.path().to_path_buf();
        config.secrets.master_key_env = "TESSERA_SERVE_TEST_UNSET_KEY".to_string();
        std::env::remove_var("TESSERA_SERVE_TEST_UNSET_KEY");

        let result = open_secret_store(&config);
        assert!(result.is_err());
    }

    #[test]
    fn test_open_secret_store_weak_master_key_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = HostConfig::default();
        config.storage.data_dir = dir.path().to_path_buf();
        config.secrets.master_key_env = "TESSERA_SERVE_TEST_WEAK_KEY".to_string();
        std::env::set_var("TESSERA_SERVE_TEST_WEAK_KEY", "short");

        let result = open_secret_store(&config);
        assert!(result.is_err());

        std::env::remove_var("TESSERA_SERVE_TEST_WEAK_KEY");
    }

    #[tokio::test]
    async fn test_cancel_propagates_to_waiters() {
        let cancel = CancellationToken::new();
        let waiter = tokio::spawn({
            let cancel = cancel.clone();
            async move { cancel.cancelled().await }
        });

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .expect("cancellation was not observed")
            .unwrap();
    }
}
