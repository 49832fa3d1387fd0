//! Service status command.

use std::path::Path;

use sshsentry_core::{
    ConnectionManager, PollEvent, PollerConfig, ServiceStatus, SystemInfoParser,
    service_status_command, start_service_poll,
};

use crate::error::CliError;
use crate::util::{connect, load_inventory, resolve_server};

/// Service status command handler
pub async fn cmd_service(
    config_path: Option<&Path>,
    server_name: &str,
    service_name: &str,
    once: bool,
) -> Result<(), CliError> {
    let inventory = load_inventory(config_path)?;
    let server = resolve_server(&inventory, server_name)?;

    let manager = ConnectionManager::new();
    let name = connect(&manager, server).await?;

    if once {
        let probe = service_status_command(service_name);
        let output = manager.exec_collect(&probe).await?;
        print_status(&SystemInfoParser::parse_service_status(
            service_name,
            &output.stdout,
        ));
        manager.disconnect(&name).await;
        return Ok(());
    }

    let (handle, mut events) = start_service_poll(
        service_name.to_string(),
        PollerConfig::new(),
        manager.exec_fn(&name),
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                handle.stop().await;
            }
            event = events.recv() => match event {
                Some(PollEvent::Service(status)) => print_status(&status),
                Some(PollEvent::Stopped) | None => break,
                Some(PollEvent::System(_)) => {}
            }
        }
    }

    manager.disconnect(&name).await;
    Ok(())
}

fn print_status(status: &ServiceStatus) {
    if status.is_active {
        println!("{}: active (since {})", status.service, status.active_since);
    } else {
        println!("{}: inactive", status.service);
    }
}
