//! Config command handlers

use crate::cli::ConfigInitArgs;
use std::fs;

const EXAMPLE_CONFIG: &str = include_str!("../../tessera.example.toml");

/// Handle `tessera config init` command.
///
/// Writes the commented example configuration so every tunable is visible
/// next to its default. Refuses to clobber an existing file unless forced.
pub fn handle_config_init(args: &ConfigInitArgs) -> Result<String, Box<dyn std::error::Error>> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "{} already exists, pass --force to overwrite it",
            args.output.display()
        )
        .into());
    }

    fs::write(&args.output, EXAMPLE_CONFIG)?;

    Ok(format!(
        "Wrote {}\nEdit it, then start the host with: tessera serve -c {}",
        args.output.display(),
        args.output.display()
    ))
}
