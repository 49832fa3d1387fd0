//! CLI error types and exit codes.

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, validation, or other non-connection errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Connection failure - session could not be established or was lost
    pub const CONNECTION_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Inventory loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server not present in the inventory
    #[error("Server not found: {0}")]
    ServerNotFound(String),

    /// Service not present on the selected server
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    /// Session establishment or command routing failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sshsentry_core::ConfigError> for CliError {
    fn from(err: sshsentry_core::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<sshsentry_core::SessionError> for CliError {
    fn from(err: sshsentry_core::SessionError) -> Self {
        Self::Connection(err.to_string())
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Connection(_) => exit_codes::CONNECTION_FAILURE,
            Self::Config(_) | Self::ServerNotFound(_) | Self::ServiceNotFound(_) | Self::Io(_) => {
                exit_codes::GENERAL_ERROR
            }
        }
    }
}
