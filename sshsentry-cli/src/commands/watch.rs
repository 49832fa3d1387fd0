//! Local file streaming command.

use std::path::Path;
use std::time::Duration;

use sshsentry_core::stream::DEFAULT_POLL_DELAY_MS;
use sshsentry_core::{TailEvent, TailerConfig, start_tailer, watch_file};

use crate::error::CliError;
use crate::util::print_line;

/// Watch command handler
pub async fn cmd_watch(path: &Path, filters: Vec<String>) -> Result<(), CliError> {
    let source = watch_file(path, Duration::from_millis(DEFAULT_POLL_DELAY_MS));
    let (handle, mut events) = start_tailer(source, filters, TailerConfig::new());

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

    Ok(())
}
