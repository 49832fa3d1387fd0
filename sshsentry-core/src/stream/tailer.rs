//! Live log stream tailer
//!
//! Consumes a potentially infinite byte-chunk source (a remote `tail -f`
//! or `journalctl -fu` channel, or a local file watch), assembles
//! complete lines, applies the active filter set, classifies severity,
//! and emits the surviving lines to a subscriber channel.
//!
//! The consuming loop is a polling design: the source exposes only a
//! non-blocking read, so empty reads suspend for a short fixed delay and
//! retry. Filter changes apply to future lines only; lines already
//! delivered are never retracted or re-filtered.

use std::collections::VecDeque;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use super::filter::FilterSet;
use super::severity::Severity;

/// Delay between empty reads of the source
pub const DEFAULT_POLL_DELAY_MS: u64 = 100;

/// Lines retained in the ring buffer
pub const DEFAULT_BUFFER_CAPACITY: usize = 10_000;

/// Capacity of the tail event channel
const TAIL_EVENT_CAPACITY: usize = 256;

/// A classified log line.
///
/// `id` is the tailer's monotonic cursor: it only ever increases, so a
/// line is never delivered twice, including across buffer trims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Monotonic line number within this tail (1-based)
    pub id: u64,
    /// Raw line text without the trailing newline
    pub text: String,
    /// Severity category for display
    pub severity: Severity,
}

/// Events emitted by a running tailer
#[derive(Debug, Clone)]
pub enum TailEvent {
    /// A line passed the filter set
    Line(LogLine),
    /// The tailer has stopped (explicit stop or source end); the
    /// underlying source is released and no further events follow
    Stopped,
}

enum TailerCommand {
    SetFilters(Vec<String>),
    Buffered(oneshot::Sender<Vec<LogLine>>),
    Stop,
}

/// Handle to control a running tailer
#[derive(Debug, Clone)]
pub struct TailerHandle {
    cmd_tx: mpsc::Sender<TailerCommand>,
}

impl TailerHandle {
    /// Replaces the active filter set.
    ///
    /// Applies from the next poll cycle onward; already-delivered lines
    /// are unaffected (the subscriber clears its own display if it wants
    /// a fresh view).
    pub async fn set_filters(&self, filters: Vec<String>) {
        let _ = self.cmd_tx.send(TailerCommand::SetFilters(filters)).await;
    }

    /// Returns the buffered raw lines (unfiltered), oldest first.
    ///
    /// The buffer is bounded; only the most recent lines up to the
    /// configured capacity are retained.
    pub async fn buffered(&self) -> Vec<LogLine> {
        let (tx, rx) = oneshot::channel();
        if self
            .cmd_tx
            .send(TailerCommand::Buffered(tx))
            .await
            .is_err()
        {
            return Vec::new();
        }
        rx.await.unwrap_or_default()
    }

    /// Signals the tail loop to stop.
    ///
    /// The loop exits within one poll cycle, dropping the source (which
    /// releases the underlying channel or file watch); the final
    /// [`TailEvent::Stopped`] confirms teardown.
    pub async fn stop(&self) {
        let _ = self.cmd_tx.send(TailerCommand::Stop).await;
    }
}

/// Tailer configuration
#[derive(Debug, Clone)]
pub struct TailerConfig {
    /// Sleep between empty source reads
    pub poll_delay: Duration,
    /// Ring buffer capacity in lines
    pub buffer_capacity: usize,
}

impl Default for TailerConfig {
    fn default() -> Self {
        Self {
            poll_delay: Duration::from_millis(DEFAULT_POLL_DELAY_MS),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl TailerConfig {
    /// Creates the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the empty-read poll delay
    #[must_use]
    pub const fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    /// Sets the ring buffer capacity
    #[must_use]
    pub const fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }
}

/// Per-tail mutable state
struct StreamState {
    filters: FilterSet,
    buffer: VecDeque<LogLine>,
    buffer_capacity: usize,
    /// Monotonic cursor; the id of the last assembled line
    cursor: u64,
    /// Bytes after the final newline of the last chunk, an in-progress
    /// line carried into the next poll cycle
    partial: String,
}

impl StreamState {
    fn new(filters: Vec<String>, buffer_capacity: usize) -> Self {
        Self {
            filters: FilterSet::from_filters(filters),
            buffer: VecDeque::new(),
            buffer_capacity,
            cursor: 0,
            partial: String::new(),
        }
    }

    /// Assembles complete lines out of a raw chunk. Returns the newly
    /// completed lines; the trailing partial stays buffered.
    fn ingest(&mut self, chunk: &[u8]) -> Vec<LogLine> {
        self.partial.push_str(&String::from_utf8_lossy(chunk));

        let Some(newline_pos) = self.partial.rfind('\n') else {
            return Vec::new();
        };
        let complete = self.partial[..newline_pos].to_string();
        self.partial.drain(..=newline_pos);

        let mut lines = Vec::new();
        for text in complete.split('\n') {
            let text = text.strip_suffix('\r').unwrap_or(text);
            self.cursor += 1;
            let line = LogLine {
                id: self.cursor,
                text: text.to_string(),
                severity: Severity::classify(text),
            };
            if self.buffer.len() >= self.buffer_capacity {
                // Trimming never rewinds the cursor, so trimmed lines
                // cannot be re-delivered.
                self.buffer.pop_front();
            }
            self.buffer.push_back(line.clone());
            lines.push(line);
        }
        lines
    }
}

/// Starts tailing `source` on its own task.
///
/// Returns a handle for filter changes and stopping, plus the receiver
/// delivering [`TailEvent`]s in source order.
#[must_use]
pub fn start_tailer(
    mut source: mpsc::Receiver<Vec<u8>>,
    filters: Vec<String>,
    config: TailerConfig,
) -> (TailerHandle, mpsc::Receiver<TailEvent>) {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<TailerCommand>(8);
    let (event_tx, event_rx) = mpsc::channel::<TailEvent>(TAIL_EVENT_CAPACITY);

    tokio::spawn(async move {
        let mut state = StreamState::new(filters, config.buffer_capacity);

        loop {
            // Commands first, so stop/filter changes take effect within
            // one poll cycle even under a steady data flow.
            loop {
                match cmd_rx.try_recv() {
                    Ok(TailerCommand::SetFilters(filters)) => {
                        tracing::debug!(count = filters.len(), "Replacing tail filters");
                        state.filters.replace(filters);
                    }
                    Ok(TailerCommand::Buffered(reply)) => {
                        let _ = reply.send(state.buffer.iter().cloned().collect());
                    }
                    Ok(TailerCommand::Stop) => {
                        drop(source); // release the underlying stream
                        let _ = event_tx.send(TailEvent::Stopped).await;
                        return;
                    }
                    Err(_) => break,
                }
            }

            // Drain whatever the source has available right now.
            let mut received_data = false;
            let mut source_closed = false;
            loop {
                match source.try_recv() {
                    Ok(chunk) => {
                        received_data = true;
                        for line in state.ingest(&chunk) {
                            if !state.filters.matches(&line.text) {
                                continue;
                            }
                            if event_tx.send(TailEvent::Line(line)).await.is_err() {
                                // Subscriber gone; tear down quietly.
                                return;
                            }
                        }
                    }
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        source_closed = true;
                        break;
                    }
                }
            }

            if source_closed {
                tracing::debug!("Tail source ended");
                let _ = event_tx.send(TailEvent::Stopped).await;
                return;
            }

            if !received_data {
                // Empty read: no delivery, just the poll delay.
                tokio::time::sleep(config.poll_delay).await;
            }
        }
    });

    (TailerHandle { cmd_tx }, event_rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAST: Duration = Duration::from_millis(5);

    fn fast_config() -> TailerConfig {
        TailerConfig::new().with_poll_delay(FAST)
    }

    async fn next_line(events: &mut mpsc::Receiver<TailEvent>) -> LogLine {
        loop {
            match events.recv().await {
                Some(TailEvent::Line(line)) => return line,
                Some(TailEvent::Stopped) => panic!("unexpected stop"),
                None => panic!("event channel closed"),
            }
        }
    }

    #[tokio::test]
    async fn test_lines_are_classified_and_ordered() {
        let (tx, source) = mpsc::channel(8);
        let (handle, mut events) = start_tailer(source, Vec::new(), fast_config());

        tx.send(b"boot ok\nERROR: disk full\n".to_vec()).await.unwrap();

        let first = next_line(&mut events).await;
        assert_eq!(first.id, 1);
        assert_eq!(first.text, "boot ok");
        assert_eq!(first.severity, Severity::Unclassified);

        let second = next_line(&mut events).await;
        assert_eq!(second.id, 2);
        assert_eq!(second.severity, Severity::Error);

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_partial_lines_span_chunks() {
        let (tx, source) = mpsc::channel(8);
        let (handle, mut events) = start_tailer(source, Vec::new(), fast_config());

        tx.send(b"incomp".to_vec()).await.unwrap();
        tx.send(b"lete line\nnext\n".to_vec()).await.unwrap();

        assert_eq!(next_line(&mut events).await.text, "incomplete line");
        assert_eq!(next_line(&mut events).await.text, "next");

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_filters_admit_matching_lines_only() {
        let (tx, source) = mpsc::channel(8);
        let (handle, mut events) =
            start_tailer(source, vec!["nginx".into()], fast_config());

        tx.send(b"redis ping\nnginx reload\nNGINX worker\n".to_vec())
            .await
            .unwrap();

        assert_eq!(next_line(&mut events).await.text, "nginx reload");
        assert_eq!(next_line(&mut events).await.text, "NGINX worker");

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_set_filters_affects_future_lines_only() {
        let (tx, source) = mpsc::channel(8);
        let (handle, mut events) = start_tailer(source, Vec::new(), fast_config());

        tx.send(b"alpha one\n".to_vec()).await.unwrap();
        assert_eq!(next_line(&mut events).await.text, "alpha one");

        handle.set_filters(vec!["beta".into()]).await;
        // Give the loop a cycle to apply the new set.
        tokio::time::sleep(FAST * 4).await;

        tx.send(b"alpha two\nbeta one\n".to_vec()).await.unwrap();
        assert_eq!(next_line(&mut events).await.text, "beta one");

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_stop_delivers_no_further_lines() {
        let (tx, source) = mpsc::channel(8);
        let (handle, mut events) = start_tailer(source, Vec::new(), fast_config());

        tx.send(b"before\n".to_vec()).await.unwrap();
        assert_eq!(next_line(&mut events).await.text, "before");

        handle.stop().await;

        // Drain to the Stopped marker; afterwards the channel is closed,
        // so nothing sent later can ever be delivered.
        loop {
            match events.recv().await {
                Some(TailEvent::Stopped) => break,
                Some(TailEvent::Line(_)) => {}
                None => panic!("channel closed without Stopped"),
            }
        }
        assert!(tx.send(b"after\n".to_vec()).await.is_err());
        assert!(events.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_source_end_stops_tailer() {
        let (tx, source) = mpsc::channel(8);
        let (_handle, mut events) = start_tailer(source, Vec::new(), fast_config());

        tx.send(b"last words\n".to_vec()).await.unwrap();
        drop(tx);

        assert_eq!(next_line(&mut events).await.text, "last words");
        loop {
            match events.recv().await {
                Some(TailEvent::Stopped) => break,
                Some(TailEvent::Line(_)) => {}
                None => panic!("channel closed without Stopped"),
            }
        }
    }

    #[tokio::test]
    async fn test_buffer_is_bounded_and_cursor_monotonic() {
        let (tx, source) = mpsc::channel(8);
        let config = fast_config().with_buffer_capacity(2);
        let (handle, mut events) = start_tailer(source, Vec::new(), config);

        tx.send(b"1\n2\n3\n4\n5\n".to_vec()).await.unwrap();
        for expected in 1..=5u64 {
            assert_eq!(next_line(&mut events).await.id, expected);
        }

        let buffered = handle.buffered().await;
        let ids: Vec<u64> = buffered.iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![4, 5]);

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_empty_chunks_yield_no_lines() {
        let (tx, source) = mpsc::channel(8);
        let (handle, mut events) = start_tailer(source, Vec::new(), fast_config());

        tx.send(Vec::new()).await.unwrap();
        tx.send(b"\n".to_vec()).await.unwrap();

        // The empty chunk produces nothing; the lone newline is one
        // genuinely empty log line, not a spurious delivery.
        let line = next_line(&mut events).await;
        assert_eq!(line.id, 1);
        assert_eq!(line.text, "");

        handle.stop().await;
    }

    #[tokio::test]
    async fn test_crlf_lines_are_trimmed() {
        let (tx, source) = mpsc::channel(8);
        let (handle, mut events) = start_tailer(source, Vec::new(), fast_config());

        tx.send(b"windows line\r\n".to_vec()).await.unwrap();
        assert_eq!(next_line(&mut events).await.text, "windows line");

        handle.stop().await;
    }
}
