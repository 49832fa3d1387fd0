//! Remote log streaming command.

use std::path::Path;

use sshsentry_core::{ConnectionManager, TailEvent, TailerConfig, start_tailer};

use crate::error::CliError;
use crate::util::{connect, load_inventory, print_line, resolve_server};

/// Tail command handler
pub async fn cmd_tail(
    config_path: Option<&Path>,
    server_name: &str,
    service_name: &str,
    filters: Vec<String>,
    journal: bool,
) -> Result<(), CliError> {
    let inventory = load_inventory(config_path)?;
    let server = resolve_server(&inventory, server_name)?;

    let log_path = server
        .find_service(service_name)
        .map(|s| s.log_path.clone())
        .ok_or_else(|| CliError::ServiceNotFound(service_name.to_string()))?;

    let manager = ConnectionManager::new();
    let name = connect(&manager, server).await?;

    let command = if journal {
        format!("journalctl -fu {service_name}")
    } else {
        format!("tail -f {log_path}")
    };

    let exec = manager.execute(&command).await?;
    let (handle, mut events) = start_tailer(exec.into_stream(), filters, TailerConfig::new());

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                handle.stop().await;
            }
            event = events.recv() => match event {
                Some(TailEvent::Line(line)) => print_line(&line),
                Some(TailEvent::Stopped) | None => break,
            }
        }
    }

    manager.disconnect(&name).await;
    Ok(())
}
