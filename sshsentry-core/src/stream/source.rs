//! Chunk sources for the tailer
//!
//! Remote sources come straight from a session's exec channel
//! ([`crate::connection::ExecHandle::into_stream`]). This module adds the
//! local-file variant: a watcher that seeds at the current end of file and
//! surfaces only content appended afterwards, preferring native
//! filesystem notification and falling back to interval polling when no
//! watcher can be established.

use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecursiveMode, Watcher};
use tokio::sync::mpsc;

/// Capacity of the file chunk channel
const WATCH_CHANNEL_CAPACITY: usize = 64;

/// Bytes consumed per file per poll cycle, so one burst of large writes
/// cannot stall the loop
const MAX_READ_BYTES_PER_CYCLE: usize = 64 * 1024;

/// Starts watching `path` for appended content.
///
/// Returns the chunk receiver consumed by
/// [`super::tailer::start_tailer`]. The watcher thread exits when the
/// receiver (or the tailer built on it) is dropped. A file that does not
/// exist yet is picked up once it appears; truncation or rotation resets
/// the read offset so rewritten content is surfaced cleanly.
#[must_use]
pub fn watch_file(path: impl Into<PathBuf>, poll_delay: Duration) -> mpsc::Receiver<Vec<u8>> {
    let path = path.into();
    let (chunk_tx, chunk_rx) = mpsc::channel(WATCH_CHANNEL_CAPACITY);

    std::thread::spawn(move || run_file_watcher(&path, poll_delay, &chunk_tx));

    chunk_rx
}

/// Blocking watch loop, one per watched file.
fn run_file_watcher(path: &Path, poll_delay: Duration, chunk_tx: &mpsc::Sender<Vec<u8>>) {
    // Native change notification where available. The poll below runs
    // either way, so a failed watcher only costs latency, not content.
    let (notify_tx, notify_rx) = std::sync::mpsc::channel::<()>();
    let mut watcher = match notify::recommended_watcher(move |_event| {
        let _ = notify_tx.send(());
    }) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::warn!(file = %path.display(), error = %e, "No native watcher, polling only");
            None
        }
    };

    if let Some(w) = watcher.as_mut() {
        // Watch the parent directory: rotation replaces the file node, and
        // events for the new node would be missed on a file-level watch.
        let target = path.parent().filter(|p| !p.as_os_str().is_empty());
        let target = target.unwrap_or(path);
        if let Err(e) = w.watch(target, RecursiveMode::NonRecursive) {
            tracing::warn!(file = %path.display(), error = %e, "Watch failed, polling only");
            watcher = None;
        }
    }

    // Seed at the current end so only content written after the watch
    // started is surfaced.
    let mut offset = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
    tracing::debug!(file = %path.display(), offset, "Tail watch started");

    loop {
        if chunk_tx.is_closed() {
            return; // subscriber gone
        }

        // Pace on notifications when we have them, otherwise sleep.
        if watcher.is_some() {
            match notify_rx.recv_timeout(poll_delay) {
                Ok(()) | Err(std::sync::mpsc::RecvTimeoutError::Timeout) => {}
                Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => {
                    watcher = None;
                }
            }
        } else {
            std::thread::sleep(poll_delay);
        }

        let size = match std::fs::metadata(path) {
            Ok(m) => m.len(),
            // Not existing (yet, or mid-rotation) is routine; keep waiting.
            Err(_) => continue,
        };

        if size < offset {
            tracing::info!(
                file = %path.display(),
                old_offset = offset,
                new_size = size,
                "File truncated or rotated, resetting offset"
            );
            offset = 0;
        }
        if size == offset {
            continue;
        }

        let available = usize::try_from(size - offset).unwrap_or(usize::MAX);
        match read_bytes_at(path, offset, available.min(MAX_READ_BYTES_PER_CYCLE)) {
            Ok(bytes) if bytes.is_empty() => {}
            Ok(bytes) => {
                offset += bytes.len() as u64;
                if chunk_tx.blocking_send(bytes).is_err() {
                    return;
                }
            }
            Err(e) => {
                // Read errors on one cycle are non-fatal; retry next cycle.
                tracing::warn!(file = %path.display(), error = %e, "Tail read failed");
            }
        }
    }
}

/// Reads up to `limit` bytes from `path` starting at `offset`.
fn read_bytes_at(path: &Path, offset: u64, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut file = std::fs::File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;
    let mut buf = vec![0u8; limit];
    let n = file.read(&mut buf)?;
    buf.truncate(n);
    Ok(buf)
}
