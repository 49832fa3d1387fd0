//! System status command.

use std::path::Path;
use std::time::Duration;

use sshsentry_core::{
    ConnectionManager, PollEvent, PollerConfig, SYSTEM_STATUS_COMMAND, SystemInfoParser,
    SystemSnapshot, start_system_poll,
};

use crate::error::CliError;
use crate::util::{connect, load_inventory, resolve_server};

/// Status command handler
pub async fn cmd_status(
    config_path: Option<&Path>,
    server_name: &str,
    once: bool,
    interval: u64,
) -> Result<(), CliError> {
    let inventory = load_inventory(config_path)?;
    let server = resolve_server(&inventory, server_name)?;

    let manager = ConnectionManager::new();
    let name = connect(&manager, server).await?;

    if once {
        let output = manager.exec_collect(SYSTEM_STATUS_COMMAND).await?;
        print_snapshot(&SystemInfoParser::parse_system_info(&output.stdout));
        manager.disconnect(&name).await;
        return Ok(());
    }

    let config = PollerConfig::new().with_interval(Duration::from_secs(interval.max(1)));
    let (handle, mut events) = start_system_poll(config, manager.exec_fn(&name));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                handle.stop().await;
            }
            event = events.recv() => match event {
                Some(PollEvent::System(snapshot)) => print_snapshot(&snapshot),
                Some(PollEvent::Stopped) | None => break,
                Some(PollEvent::Service(_)) => {}
            }
        }
    }

    manager.disconnect(&name).await;
    Ok(())
}

fn print_snapshot(snapshot: &SystemSnapshot) {
    println!(
        "mem total {} | used {} | free {}   load {:.2} {:.2} {:.2}   procs {}/{}",
        snapshot.total_memory,
        snapshot.used_memory,
        snapshot.free_memory,
        snapshot.load_average.one,
        snapshot.load_average.five,
        snapshot.load_average.fifteen,
        snapshot.running_procs,
        snapshot.total_procs,
    );
}
