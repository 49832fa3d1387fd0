//! `SshSentry` Core Library
//!
//! This crate provides the core functionality for the `SshSentry` server
//! monitor: long-lived SSH sessions, live log streaming with filters and
//! severity classification, and periodic service/system status polling.
//!
//! # Crate Structure
//!
//! - [`config`] - Server/service inventory (static JSON list)
//! - [`connection`] - Remote sessions and the connection registry
//! - [`monitoring`] - Status polling and system info parsing
//! - [`stream`] - Live log tailing, filtering, and severity classification
//! - [`control`] - Remote service control (systemctl via piped elevation)
//! - [`tracing`] - Structured logging initialization
//!
//! The presentation layer (CLI or GUI) only calls into this crate and
//! renders the events it emits; it never touches the SSH transport
//! directly.

// Enable missing_docs warning for public API documentation
#![warn(missing_docs)]

pub mod config;
pub mod connection;
pub mod control;
pub mod error;
pub mod monitoring;
pub mod stream;
pub mod tracing;

pub use config::{Inventory, ServerDescriptor, ServiceDescriptor};
pub use connection::{
    CommandOutput, ConnectionEvent, ConnectionManager, ExecHandle, RemoteSession, SessionState,
};
pub use control::{ServiceAction, control_service, is_service_active};
pub use error::{ConfigError, ConfigResult, SessionError, SessionResult, SshSentryError};
pub use monitoring::{
    LoadAverage, PollEvent, PollerConfig, PollerHandle, SYSTEM_STATUS_COMMAND, ServiceStatus,
    SystemInfoParser, SystemSnapshot, service_status_command, start_service_poll,
    start_system_poll,
};
pub use stream::{
    FilterSet, LogLine, Severity, TailEvent, TailerConfig, TailerHandle, start_tailer, watch_file,
};
pub use tracing::{TracingError, TracingLevel, init_tracing};
