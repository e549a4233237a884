//! Command-line surface of the Tessera host.
//!
//! `serve` is the main entry point; the remaining commands are local
//! utilities that read or write the stores named by the configuration.
//! A running host re-reads those stores only at startup, so use the HTTP
//! API to change a live instance.
//!
//! # Commands
//!
//! - `serve` - Start the dashboard host
//! - `widgets` - List registered widget types
//! - `secrets` - Inspect and edit stored widget secrets
//! - `config` - Write a starter configuration file
//! - `completions` - Emit a completion script for your shell
//!
//! # Example
//!
//! ```bash
//! # Start the host with default config
//! tessera serve
//!
//! # Inspect stored secrets for one widget type (masked)
//! tessera secrets show weather-widget
//!
//! # Completions for bash
//! tessera completions bash > ~/.bash_completion.d/tessera
//! ```

pub mod completions;
pub mod config;
pub mod output;
pub mod secrets;
pub mod serve;
pub mod widgets;

pub use completions::handle_completions;
pub use config::handle_config_init;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Tessera - Pluggable Dashboard Host
#[derive(Parser, Debug)]
#[command(
    name = "tessera",
    version,
    about = "Pluggable widget dashboard host"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the dashboard host
    Serve(ServeArgs),
    /// List registered widget types
    Widgets(WidgetsArgs),
    /// Inspect and edit stored widget secrets
    #[command(subcommand)]
    Secrets(SecretsCommands),
    /// Write a starter configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Emit a completion script for your shell
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Configuration file to read
    #[arg(short, long, default_value = "tessera.toml")]
    pub config: PathBuf,

    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "TESSERA_PORT")]
    pub port: Option<u16>,

    /// Address to bind (overrides the config file)
    #[arg(short = 'H', long, env = "TESSERA_HOST")]
    pub host: Option<String>,

    /// Directory holding the layout and secrets files
    #[arg(short, long, env = "TESSERA_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log level: trace, debug, info, warn or error
    #[arg(short, long, env = "TESSERA_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Store secrets as plain JSON (development only)
    #[arg(long)]
    pub plain_secrets: bool,
}

#[derive(Args, Debug)]
pub struct WidgetsArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Configuration file to read
    #[arg(short, long, default_value = "tessera.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum SecretsCommands {
    /// List widget types with stored secrets
    List(SecretsListArgs),
    /// Show one bucket, masked
    Show(SecretsShowArgs),
    /// Replace one bucket from key=value pairs
    Set(SecretsSetArgs),
    /// Delete one bucket
    Delete(SecretsDeleteArgs),
}

#[derive(Args, Debug)]
pub struct SecretsListArgs {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Configuration file to read
    #[arg(short, long, default_value = "tessera.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct SecretsShowArgs {
    /// Widget type id
    pub widget: String,

    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,

    /// Configuration file to read
    #[arg(short, long, default_value = "tessera.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct SecretsSetArgs {
    /// Widget type id
    pub widget: String,

    /// Fields as key=value pairs (values stored as strings)
    #[arg(required = true)]
    pub fields: Vec<String>,

    /// Configuration file to read
    #[arg(short, long, default_value = "tessera.toml")]
    pub config: PathBuf,
}

#[derive(Args, Debug)]
pub struct SecretsDeleteArgs {
    /// Widget type id
    pub widget: String,

    /// Configuration file to read
    #[arg(short, long, default_value = "tessera.toml")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a commented example configuration
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Where to write the file
    #[arg(short, long, default_value = "tessera.toml")]
    pub output: PathBuf,

    /// Replace the file if it already exists
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
