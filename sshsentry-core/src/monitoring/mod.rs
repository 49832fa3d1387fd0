//! Remote host monitoring
//!
//! Agentless status sampling over the SSH session: a poller re-issues
//! short read-only commands on a fixed interval and a total parser turns
//! the raw `/proc` and `systemctl` output into immutable snapshots. This
//! module is presentation-free; frontends subscribe to the event channel
//! and render what arrives.

mod parser;
mod poller;
mod snapshot;

pub use parser::{SYSTEM_STATUS_COMMAND, SystemInfoParser, service_status_command};
pub use poller::{
    DEFAULT_POLL_INTERVAL_SECS, PollEvent, PollerConfig, PollerHandle, start_service_poll,
    start_system_poll,
};
pub use snapshot::{LoadAverage, ServiceStatus, SystemSnapshot};
