//! Server/service inventory for `SshSentry`
//!
//! The inventory is a static JSON list of servers, each carrying the
//! services whose logs and status the operator wants to observe. It is
//! loaded once at startup and may be reloaded on demand; a reload replaces
//! the in-memory list wholesale (no merging), so sessions tied to a server
//! removed by the reload become orphaned and must be reconnected
//! explicitly.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// File name of the inventory below the user configuration directory
const INVENTORY_FILE: &str = "servers.json";

/// Directory name below the user configuration directory
const CONFIG_DIR: &str = "sshsentry";

/// Default SSH port used when a server entry omits one
const fn default_port() -> u16 {
    22
}

/// A service on a remote server: a name plus the log file it writes to
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceDescriptor {
    /// systemd unit name (without the `.service` suffix)
    pub name: String,
    /// Absolute path of the service's log file on the remote host
    pub log_path: String,
}

/// A remote server entry. Immutable after load; unique by `name`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerDescriptor {
    /// Display name, also the registry key for its session
    pub name: String,
    /// Hostname or IP address
    pub host: String,
    /// SSH port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Login user
    pub username: String,
    /// Login password. Absent entries prompt at the frontend; the secret
    /// is never serialized back out or printed in the clear.
    #[serde(default)]
    pub password: Option<SecretString>,
    /// Services to observe on this server
    #[serde(default)]
    pub services: Vec<ServiceDescriptor>,
}

impl ServerDescriptor {
    /// Returns `host:port` for connecting
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Looks up a service by name
    #[must_use]
    pub fn find_service(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.services.iter().find(|s| s.name == name)
    }
}

/// The loaded server inventory
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Inventory {
    /// All configured servers
    #[serde(default)]
    pub servers: Vec<ServerDescriptor>,
}

impl Inventory {
    /// Loads and validates the inventory from a JSON file.
    ///
    /// `~` in the path is expanded. Reloading is just calling this again
    /// and replacing the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Parse`] for malformed JSON, and
    /// [`ConfigError::Validation`] for duplicate server or service names.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
        let raw = std::fs::read_to_string(&expanded).map_err(|source| ConfigError::Io {
            path: expanded.clone(),
            source,
        })?;

        let inventory: Self =
            serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: expanded,
                source,
            })?;

        inventory.validate()?;
        tracing::info!(servers = inventory.servers.len(), "Inventory loaded");
        Ok(inventory)
    }

    /// Loads the inventory from the default location
    /// (`$XDG_CONFIG_HOME/sshsentry/servers.json` or the platform
    /// equivalent).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if no configuration directory can
    /// be resolved, otherwise the same errors as [`Self::load`].
    pub fn load_default() -> ConfigResult<Self> {
        let path = Self::default_path().ok_or(ConfigError::NotFound)?;
        Self::load(&path)
    }

    /// Returns the default inventory path, if a config directory exists
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR).join(INVENTORY_FILE))
    }

    /// Looks up a server by name
    #[must_use]
    pub fn find_server(&self, name: &str) -> Option<&ServerDescriptor> {
        self.servers.iter().find(|s| s.name == name)
    }

    /// Checks uniqueness constraints: server names are globally unique,
    /// service names are unique within their server.
    fn validate(&self) -> ConfigResult<()> {
        let mut seen = std::collections::HashSet::new();
        for server in &self.servers {
            if server.name.trim().is_empty() {
                return Err(ConfigError::Validation("empty server name".into()));
            }
            if !seen.insert(server.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate server name '{}'",
                    server.name
                )));
            }

            let mut seen_services = std::collections::HashSet::new();
            for service in &server.services {
                if !seen_services.insert(service.name.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "duplicate service '{}' on server '{}'",
                        service.name, server.name
                    )));
                }
            }
        }
        Ok(())
    }
}
