//! Shared helpers for command handlers.

use std::path::Path;

use secrecy::SecretString;
use sshsentry_core::{
    ConnectionEvent, ConnectionManager, Inventory, LogLine, ServerDescriptor, Severity,
};

use crate::error::CliError;

/// Loads the inventory from `config_path` or the default location.
pub fn load_inventory(config_path: Option<&Path>) -> Result<Inventory, CliError> {
    match config_path {
        Some(path) => Ok(Inventory::load(path)?),
        None => Ok(Inventory::load_default()?),
    }
}

/// Resolves a server entry, prompting for the password when the inventory
/// omits it.
pub fn resolve_server(inventory: &Inventory, name: &str) -> Result<ServerDescriptor, CliError> {
    let mut server = inventory
        .find_server(name)
        .cloned()
        .ok_or_else(|| CliError::ServerNotFound(name.to_string()))?;

    if server.password.is_none() {
        let prompt = format!("Password for {}@{}: ", server.username, server.host);
        let password = rpassword::prompt_password(prompt)?;
        server.password = Some(SecretString::from(password));
    }

    Ok(server)
}

/// Connects through the manager and waits for the single outcome event.
pub async fn connect(
    manager: &ConnectionManager,
    server: ServerDescriptor,
) -> Result<String, CliError> {
    let name = server.name.clone();
    tracing::debug!(server = %name, "Awaiting connection result");
    let mut events = manager.connect(server);

    match events.recv().await {
        Some(ConnectionEvent::Connected { server }) => Ok(server),
        Some(ConnectionEvent::Failed { error, .. }) => Err(CliError::Connection(error)),
        None => Err(CliError::Connection(format!(
            "no connection result for '{name}'"
        ))),
    }
}

/// Prints a log line with a severity color on ANSI terminals.
pub fn print_line(line: &LogLine) {
    let color = match line.severity {
        Severity::Error => "\x1b[31m",
        Severity::Warning => "\x1b[33m",
        Severity::Info => "\x1b[34m",
        Severity::Unclassified => "",
    };
    if color.is_empty() {
        println!("{}", line.text);
    } else {
        println!("{color}{}\x1b[0m", line.text);
    }
}
