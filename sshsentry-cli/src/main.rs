//! `SshSentry` CLI - command-line frontend for the `SshSentry` core
//!
//! Provides commands for listing the inventory, watching server status,
//! streaming service logs with live filters, and controlling services.
//! All remote work happens in `sshsentry-core`; this binary only renders
//! the events it receives.

mod cli;
mod commands;
mod error;
mod util;

use clap::Parser;
use cli::Cli;
use sshsentry_core::TracingLevel;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        TracingLevel::Error
    } else {
        match cli.verbose {
            0 => TracingLevel::Info,
            1 => TracingLevel::Debug,
            _ => TracingLevel::Trace,
        }
    };
    if let Err(e) = sshsentry_core::init_tracing(level) {
        eprintln!("Warning: {e}");
    }

    let result = commands::dispatch(cli.config.as_deref(), cli.command).await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}
