//! Remote sessions and the connection registry
//!
//! A [`RemoteSession`] is one authenticated SSH transport bound to one
//! server; the [`ConnectionManager`] owns at most one session per server
//! name and routes command and stream requests to the active one.

mod manager;
mod session;

pub use manager::{
    ConnectionEvent, ConnectionManager, DEFAULT_CONNECT_TIMEOUT_SECS,
};
pub use session::{CommandOutput, ExecHandle, RemoteSession, SessionState};
