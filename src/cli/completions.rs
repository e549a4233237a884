//! Completions command implementation

use crate::cli::{Cli, CompletionsArgs};
use clap::CommandFactory;
use clap_complete::{generate, Shell};
use std::io::Write;

/// Render the completion script for one shell into `out`.
fn write_completions<W: Write>(shell: Shell, out: &mut W) {
    let mut command = Cli::command();
    let bin_name = command.get_name().to_string();
    generate(shell, &mut command, bin_name, out);
}

/// Handle `tessera completions` command
pub fn handle_completions(args: &CompletionsArgs) {
    write_completions(args.shell, &mut std::io::stdout());
}
