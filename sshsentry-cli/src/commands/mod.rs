//! Command handler modules for the CLI.

mod control;
mod list;
mod service;
mod status;
mod tail;
mod watch;

use std::path::Path;

use crate::cli::Commands;
use crate::error::CliError;

/// Dispatch a CLI command to the appropriate handler.
pub async fn dispatch(config_path: Option<&Path>, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::List => list::cmd_list(config_path),
        Commands::Status {
            server,
            once,
            interval,
        } => status::cmd_status(config_path, &server, once, interval).await,
        Commands::Tail {
            server,
            service,
            filter,
            journal,
        } => tail::cmd_tail(config_path, &server, &service, filter, journal).await,
        Commands::Watch { path, filter } => watch::cmd_watch(&path, filter).await,
        Commands::Service {
            server,
            service,
            once,
        } => service::cmd_service(config_path, &server, &service, once).await,
        Commands::Control {
            server,
            action,
            service,
        } => control::cmd_control(config_path, &server, action.into(), &service).await,
    }
}
