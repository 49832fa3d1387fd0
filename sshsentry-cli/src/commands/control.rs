//! Service control command.

use std::path::Path;

use sshsentry_core::{ConnectionManager, ServiceAction, control_service};

use crate::error::CliError;
use crate::util::{connect, load_inventory, resolve_server};

/// Control command handler
pub async fn cmd_control(
    config_path: Option<&Path>,
    server_name: &str,
    action: ServiceAction,
    service_name: &str,
) -> Result<(), CliError> {
    let inventory = load_inventory(config_path)?;
    let server = resolve_server(&inventory, server_name)?;

    let manager = ConnectionManager::new();
    let name = connect(&manager, server).await?;

    let session = manager
        .session(&name)
        .await
        .ok_or_else(|| CliError::Connection(format!("session for '{name}' vanished")))?;

    let output = control_service(&session, action, service_name).await?;

    if output.success() {
        println!("{service_name}: {action} ok");
    } else {
        let detail = output.stderr.trim();
        let code = output
            .exit_status
            .map_or_else(|| "?".to_string(), |c| c.to_string());
        println!(
            "{service_name}: {action} failed (exit {code}){}{detail}",
            if detail.is_empty() { "" } else { ": " },
        );
    }

    manager.disconnect(&name).await;
    Ok(())
}
