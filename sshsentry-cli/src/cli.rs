//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use sshsentry_core::ServiceAction;

/// `SshSentry` command-line interface for monitoring remote servers
#[derive(Parser)]
#[command(name = "sshsentry")]
#[command(author, version, about = "SshSentry server monitor")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the inventory file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List configured servers and their services
    #[command(about = "List all servers in the inventory")]
    List,

    /// Connect to a server and poll its system status
    #[command(about = "Show live memory and load figures for a server")]
    Status {
        /// Server name from the inventory
        server: String,

        /// Print a single snapshot and exit instead of polling
        #[arg(long)]
        once: bool,

        /// Poll interval in seconds
        #[arg(short, long, default_value_t = 5)]
        interval: u64,
    },

    /// Stream a remote service's log live
    #[command(about = "Follow a service log with optional filters")]
    Tail {
        /// Server name from the inventory
        server: String,

        /// Service name on that server
        service: String,

        /// Case-insensitive substring filter; repeatable, any match admits
        #[arg(short, long)]
        filter: Vec<String>,

        /// Follow the systemd journal instead of the log file
        #[arg(short, long)]
        journal: bool,
    },

    /// Tail a local log file on this machine
    #[command(about = "Follow a local file with optional filters")]
    Watch {
        /// Path of the file to follow
        path: PathBuf,

        /// Case-insensitive substring filter; repeatable, any match admits
        #[arg(short, long)]
        filter: Vec<String>,
    },

    /// Poll a service's active state
    #[command(about = "Show whether a service is active and since when")]
    Service {
        /// Server name from the inventory
        server: String,

        /// Service name on that server
        service: String,

        /// Print a single status and exit instead of polling
        #[arg(long)]
        once: bool,
    },

    /// Run a privileged lifecycle action on a service
    #[command(about = "Start, stop, or restart a remote service")]
    Control {
        /// Server name from the inventory
        server: String,

        /// Action to run
        #[arg(value_enum)]
        action: ServiceActionArg,

        /// Service name on that server
        service: String,
    },
}

/// Service action argument
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ServiceActionArg {
    /// Start the service
    Start,
    /// Stop the service
    Stop,
    /// Restart the service
    Restart,
}

impl From<ServiceActionArg> for ServiceAction {
    fn from(arg: ServiceActionArg) -> Self {
        match arg {
            ServiceActionArg::Start => Self::Start,
            ServiceActionArg::Stop => Self::Stop,
            ServiceActionArg::Restart => Self::Restart,
        }
    }
}
