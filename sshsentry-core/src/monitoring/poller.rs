//! Periodic status polling over a remote session
//!
//! A poller repeatedly runs a short read-only command through an exec
//! callback, parses the output, and emits the snapshot on an event
//! channel. A failed tick is logged and skipped; the loop runs until the
//! handle is stopped or the subscriber drops its receiver.

use std::time::Duration;

use tokio::sync::mpsc;

use super::parser::{SYSTEM_STATUS_COMMAND, SystemInfoParser, service_status_command};
use super::snapshot::{ServiceStatus, SystemSnapshot};

/// Default polling interval in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Capacity of the poll event channel
const POLL_EVENT_CAPACITY: usize = 8;

/// Events emitted by a running poller
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// New system snapshot available
    System(SystemSnapshot),
    /// New service status available
    Service(ServiceStatus),
    /// The poller has stopped; no further events follow
    Stopped,
}

/// Handle to control a running poller
#[derive(Debug)]
pub struct PollerHandle {
    stop_tx: mpsc::Sender<()>,
}

impl PollerHandle {
    /// Signals the poll loop to stop.
    ///
    /// Effective within one interval; an in-flight command execution is
    /// allowed to complete and its result is discarded. The final
    /// [`PollEvent::Stopped`] confirms teardown.
    pub async fn stop(&self) {
        let _ = self.stop_tx.send(()).await;
    }
}

/// Polling configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Interval between ticks
    pub interval: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

impl PollerConfig {
    /// Creates a config with the default 5-second interval
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the poll interval
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// Starts a system status poll loop.
///
/// Every tick executes [`SYSTEM_STATUS_COMMAND`] through `exec` and emits
/// a [`PollEvent::System`] snapshot. The `exec` callback abstracts the
/// transport so the loop works against any session (or a test double);
/// [`crate::ConnectionManager::exec_fn`] produces the production shape.
///
/// Returns a handle to stop the loop and the receiver for its events.
pub fn start_system_poll<F, Fut>(
    config: PollerConfig,
    exec: F,
) -> (PollerHandle, mpsc::Receiver<PollEvent>)
where
    F: Fn(String) -> Fut + Send + 'static,
    Fut: Future<Output = Result<String, String>> + Send,
{
    start_poll(
        config,
        exec,
        "system",
        SYSTEM_STATUS_COMMAND.to_string(),
        |output| PollEvent::System(SystemInfoParser::parse_system_info(&output)),
    )
}

/// Starts a service status poll loop for `service`.
///
/// Every tick runs the `is-active` probe and emits a
/// [`PollEvent::Service`] status. A torn-down subscriber ends the loop
/// quietly instead of erroring.
pub fn start_service_poll<F, Fut>(
    service: String,
    config: PollerConfig,
    exec: F,
) -> (PollerHandle, mpsc::Receiver<PollEvent>)
where
    F: Fn(String) -> Fut + Send + 'static,
    Fut: Future<Output = Result<String, String>> + Send,
{
    let probe = service_status_command(&service);
    start_poll(config, exec, "service", probe, move |output| {
        PollEvent::Service(SystemInfoParser::parse_service_status(&service, &output))
    })
}

/// Shared poll loop. `command` is re-issued every tick; `to_event` turns
/// its raw output into the emitted event.
fn start_poll<F, Fut, E>(
    config: PollerConfig,
    exec: F,
    kind: &'static str,
    command: String,
    to_event: E,
) -> (PollerHandle, mpsc::Receiver<PollEvent>)
where
    F: Fn(String) -> Fut + Send + 'static,
    Fut: Future<Output = Result<String, String>> + Send,
    E: Fn(String) -> PollEvent + Send + 'static,
{
    let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
    let (event_tx, event_rx) = mpsc::channel::<PollEvent>(POLL_EVENT_CAPACITY);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.interval);

        loop {
            tokio::select! {
                _ = stop_rx.recv() => {
                    let _ = event_tx.send(PollEvent::Stopped).await;
                    break;
                }
                _ = ticker.tick() => {
                    match exec(command.clone()).await {
                        Ok(output) => {
                            if event_tx.send(to_event(output)).await.is_err() {
                                // Subscriber torn down; nothing left to report to.
                                tracing::debug!(kind, "Poll subscriber dropped, stopping");
                                break;
                            }
                        }
                        Err(err) => {
                            // A failed tick is skipped, never fatal; the next
                            // tick fires after the normal interval.
                            tracing::warn!(kind, error = %err, "Poll tick failed, skipping");
                        }
                    }
                }
            }
        }
    });

    (PollerHandle { stop_tx }, event_rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    const TICK: Duration = Duration::from_millis(10);

    fn fast_config() -> PollerConfig {
        PollerConfig::new().with_interval(TICK)
    }

    #[tokio::test]
    async fn test_system_poll_emits_snapshots() {
        let (handle, mut events) = start_system_poll(fast_config(), |_cmd| async {
            Ok("MemTotal: 2097152 kB\nMemAvailable: 1048576 kB\n1.0 0.5 0.2 2/100 1234".to_string())
        });

        match events.recv().await {
            Some(PollEvent::System(snapshot)) => {
                assert_eq!(snapshot.total_memory, "2.00 GB");
                assert_eq!(snapshot.used_memory, "1.00 GB");
            }
            other => panic!("expected system snapshot, got {other:?}"),
        }

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_service_poll_emits_status() {
        let (handle, mut events) =
            start_service_poll("nginx".to_string(), fast_config(), |cmd| async move {
                assert!(cmd.contains("is-active nginx"));
                Ok("active\nActiveEnterTimestamp=Mon 2026-08-03 10:00:00 UTC\n".to_string())
            });

        match events.recv().await {
            Some(PollEvent::Service(status)) => {
                assert_eq!(status.service, "nginx");
                assert!(status.is_active);
            }
            other => panic!("expected service status, got {other:?}"),
        }

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_failed_tick_does_not_stop_loop() {
        // First tick errors; subsequent ticks must still fire.
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let (handle, mut events) = start_system_poll(fast_config(), move |_cmd| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err("injected transport error".to_string())
                } else {
                    Ok("MemTotal: 1048576 kB\nMemAvailable: 524288 kB\n".to_string())
                }
            }
        });

        // The first delivered event comes from the tick after the failure.
        match events.recv().await {
            Some(PollEvent::System(snapshot)) => {
                assert_eq!(snapshot.total_memory, "1.00 GB");
            }
            other => panic!("expected system snapshot, got {other:?}"),
        }
        assert!(calls.load(Ordering::SeqCst) >= 2);

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_stop_emits_stopped_event() {
        let (handle, mut events) =
            start_system_poll(fast_config(), |_cmd| async { Ok(String::new()) });

        handle.stop().await;

        // Drain until the Stopped marker; the channel then closes.
        loop {
            match events.recv().await {
                Some(PollEvent::Stopped) => break,
                Some(_) => {}
                None => panic!("channel closed without Stopped event"),
            }
        }
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_dropped_subscriber_ends_loop() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let (_handle, events) = start_system_poll(fast_config(), move |_cmd| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(String::new()) }
        });

        drop(events);
        tokio::time::sleep(TICK * 10).await;
        let after_drop = calls.load(Ordering::SeqCst);

        // The loop notices the dropped receiver on its next delivery and
        // exits; call counts must stop growing shortly after.
        tokio::time::sleep(TICK * 10).await;
        let later = calls.load(Ordering::SeqCst);
        assert!(later <= after_drop + 1);
    }
}
