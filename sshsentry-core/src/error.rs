//! Error types for the `SshSentry` core library
//!
//! Connection-level failures surface once to the caller; per-tick failures
//! in pollers and tailers are logged and retried on the next cycle; parser
//! failures are absorbed entirely. Nothing in this crate terminates the
//! process on a failed remote operation.

use thiserror::Error;

/// Errors that can occur while loading or validating the server inventory
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The inventory file could not be read
    #[error("Failed to read inventory '{path}': {source}")]
    Io {
        /// Path that was attempted
        path: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The inventory file is not valid JSON
    #[error("Failed to parse inventory '{path}': {source}")]
    Parse {
        /// Path that was attempted
        path: String,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The inventory content violates a uniqueness or shape constraint
    #[error("Invalid inventory: {0}")]
    Validation(String),

    /// No inventory file exists and no default location could be resolved
    #[error("No inventory file found")]
    NotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur on a remote session or when routing commands to one
#[derive(Debug, Error)]
pub enum SessionError {
    /// The server rejected the supplied credentials
    #[error("Authentication failed for '{0}'")]
    AuthenticationFailed(String),

    /// The TCP/SSH handshake could not be completed
    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    /// The connection attempt exceeded its deadline
    #[error("Connection timed out after {0} seconds")]
    Timeout(u64),

    /// A command was issued but no session is currently connected
    #[error("No active session")]
    NoActiveSession,

    /// The server descriptor carries no password to authenticate with
    #[error("No password available for '{0}'")]
    MissingCredentials(String),

    /// A new exec channel could not be opened on the session
    #[error("Failed to open channel: {0}")]
    ChannelOpen(String),

    /// Mid-command transport failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The session has been disconnected
    #[error("Session is disconnected")]
    Disconnected,
}

impl From<russh::Error> for SessionError {
    fn from(err: russh::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Top-level error wrapper for frontends consuming the core
#[derive(Debug, Error)]
pub enum SshSentryError {
    /// Inventory loading or validation failed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A session operation failed
    #[error(transparent)]
    Session(#[from] SessionError),
}
