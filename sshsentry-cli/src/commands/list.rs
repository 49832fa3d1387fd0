//! List inventory command.

use std::path::Path;

use crate::error::CliError;
use crate::util::load_inventory;

/// List command handler
pub fn cmd_list(config_path: Option<&Path>) -> Result<(), CliError> {
    let inventory = load_inventory(config_path)?;

    if inventory.servers.is_empty() {
        println!("No servers configured.");
        return Ok(());
    }

    for server in &inventory.servers {
        println!("{} ({}@{})", server.name, server.username, server.address());
        for service in &server.services {
            println!("  {:<20} {}", service.name, service.log_path);
        }
    }

    Ok(())
}
