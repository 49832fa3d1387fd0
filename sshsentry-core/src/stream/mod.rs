//! Live log streaming
//!
//! Turns a growing remote output source (or a local file) into an ordered
//! sequence of classified, filtered lines delivered on an event channel.

mod filter;
mod severity;
mod source;
mod tailer;

pub use filter::FilterSet;
pub use severity::Severity;
pub use source::watch_file;
pub use tailer::{
    DEFAULT_BUFFER_CAPACITY, DEFAULT_POLL_DELAY_MS, LogLine, TailEvent, TailerConfig,
    TailerHandle, start_tailer,
};
