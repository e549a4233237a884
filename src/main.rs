use clap::Parser;
use tessera::cli::{
    handle_completions, handle_config_init, secrets, widgets, Cli, Commands, ConfigCommands,
    SecretsCommands,
};
use tessera::config::HostConfig;
use tessera::registry::WidgetRegistry;

fn load_local_config(path: &std::path::Path) -> HostConfig {
    HostConfig::load(Some(path))
        .unwrap_or_else(|_| HostConfig::default())
        .with_env_overrides()
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve(args) => tessera::cli::serve::run_serve(args).await,
        Commands::Widgets(args) => {
            let config = load_local_config(&args.config);
            let registry = WidgetRegistry::with_builtins();
            // The store is optional here, the listing degrades to "missing"
            let store = secrets::open_cli_store(&config).ok();

            widgets::handle_widgets(&args, &registry, store.as_ref())
                .map(|output| println!("{}", output))
        }
        Commands::Secrets(cmd) => match cmd {
            SecretsCommands::List(args) => {
                let config = load_local_config(&args.config);
                let registry = WidgetRegistry::with_builtins();

                secrets::open_cli_store(&config)
                    .and_then(|store| secrets::handle_secrets_list(&args, &store, &registry))
                    .map(|output| println!("{}", output))
            }
            SecretsCommands::Show(args) => {
                let config = load_local_config(&args.config);

                secrets::open_cli_store(&config)
                    .and_then(|store| secrets::handle_secrets_show(&args, &store))
                    .map(|output| println!("{}", output))
            }
            SecretsCommands::Set(args) => {
                let config = load_local_config(&args.config);
                let registry = WidgetRegistry::with_builtins();

                secrets::open_cli_store(&config)
                    .and_then(|store| secrets::handle_secrets_set(&args, &store, &registry))
                    .map(|output| println!("{}", output))
            }
            SecretsCommands::Delete(args) => {
                let config = load_local_config(&args.config);

                secrets::open_cli_store(&config)
                    .and_then(|store| secrets::handle_secrets_delete(&args, &store))
                    .map(|output| println!("{}", output))
            }
        },
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => {
                handle_config_init(&args).map(|output| println!("{}", output))
            }
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
