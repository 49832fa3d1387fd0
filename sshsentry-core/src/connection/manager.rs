//! Registry of remote sessions, keyed by server name
//!
//! The manager owns the connect/disconnect lifecycle and routes command
//! and stream requests to the active session. At most one session exists
//! per server name; reconnecting supersedes (and disconnects) the prior
//! session instead of duplicating it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{RwLock, mpsc};

use crate::config::ServerDescriptor;
use crate::error::{SessionError, SessionResult};

use super::session::{CommandOutput, ExecHandle, RemoteSession, SessionState};

/// Default deadline for a connection attempt
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Outcome of a [`ConnectionManager::connect`] call.
///
/// Exactly one event is delivered per call; there is no ordering
/// guarantee across concurrent connects to different servers.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// The session is authenticated and registered
    Connected {
        /// Server name
        server: String,
    },
    /// The attempt failed; nothing stays registered
    Failed {
        /// Server name
        server: String,
        /// Human-readable failure cause
        error: String,
    },
}

type SessionMap = Arc<RwLock<HashMap<String, Arc<RemoteSession>>>>;

/// Owns all remote sessions and routes commands to the active one
pub struct ConnectionManager {
    sessions: SessionMap,
    active: Arc<RwLock<Option<String>>>,
    connect_timeout: Duration,
}

impl ConnectionManager {
    /// Creates an empty manager with the default connect timeout
    #[must_use]
    pub fn new() -> Self {
        Self::with_connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
    }

    /// Creates an empty manager with a custom connect timeout
    #[must_use]
    pub fn with_connect_timeout(connect_timeout: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            active: Arc::new(RwLock::new(None)),
            connect_timeout,
        }
    }

    /// Starts an asynchronous connection attempt to `server`.
    ///
    /// Never blocks the caller. The returned channel delivers exactly one
    /// [`ConnectionEvent`]. On success the session is registered under the
    /// server's name (superseding any previous one) and becomes the active
    /// server. Failures are reported once and never retried automatically.
    pub fn connect(&self, server: ServerDescriptor) -> mpsc::Receiver<ConnectionEvent> {
        let (event_tx, event_rx) = mpsc::channel(1);
        let sessions = Arc::clone(&self.sessions);
        let active = Arc::clone(&self.active);
        let timeout = self.connect_timeout;

        tokio::spawn(async move {
            let name = server.name.clone();
            tracing::info!(server = %name, host = %server.host, "Connecting");

            let session = match RemoteSession::new(&server) {
                Ok(session) => Arc::new(session),
                Err(e) => {
                    tracing::warn!(server = %name, error = %e, "Connection rejected");
                    let _ = event_tx
                        .send(ConnectionEvent::Failed {
                            server: name,
                            error: e.to_string(),
                        })
                        .await;
                    return;
                }
            };

            match session.establish(timeout).await {
                Ok(()) => {
                    register_session(&sessions, Arc::clone(&session)).await;
                    *active.write().await = Some(name.clone());
                    tracing::info!(server = %name, "Connected");
                    let _ = event_tx
                        .send(ConnectionEvent::Connected { server: name })
                        .await;
                }
                Err(e) => {
                    tracing::warn!(server = %name, error = %e, "Connection failed");
                    let _ = event_tx
                        .send(ConnectionEvent::Failed {
                            server: name,
                            error: e.to_string(),
                        })
                        .await;
                }
            }
        });

        event_rx
    }

    /// Tears down and removes the session for `server_name`.
    ///
    /// Idempotent: disconnecting an unknown server is a no-op.
    pub async fn disconnect(&self, server_name: &str) {
        let removed = self.sessions.write().await.remove(server_name);
        if let Some(session) = removed {
            session.disconnect().await;
            tracing::info!(server = %server_name, "Disconnected");
        }

        let mut active = self.active.write().await;
        if active.as_deref() == Some(server_name) {
            *active = None;
        }
    }

    /// Disconnects every registered session
    pub async fn disconnect_all(&self) {
        let names: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        for name in names {
            self.disconnect(&name).await;
        }
    }

    /// Executes `command` on the active server's session.
    ///
    /// Fails fast: no session selected, session missing, or session not
    /// Connected all return [`SessionError::NoActiveSession`] without
    /// blocking or retrying.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoActiveSession`] as above, otherwise the session's
    /// own transport errors.
    pub async fn execute(&self, command: &str) -> SessionResult<ExecHandle> {
        let session = self.active_session().await?;
        session.exec(command).await
    }

    /// Executes `command` on the active session and collects its output.
    ///
    /// # Errors
    ///
    /// Same as [`Self::execute`].
    pub async fn exec_collect(&self, command: &str) -> SessionResult<CommandOutput> {
        let session = self.active_session().await?;
        session.exec_collect(command).await
    }

    /// Selects which registered server subsequent commands route to.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoActiveSession`] when no session is registered
    /// under `server_name`.
    pub async fn set_active(&self, server_name: &str) -> SessionResult<()> {
        if !self.sessions.read().await.contains_key(server_name) {
            return Err(SessionError::NoActiveSession);
        }
        *self.active.write().await = Some(server_name.to_string());
        Ok(())
    }

    /// Name of the currently active server, if any
    pub async fn active_server(&self) -> Option<String> {
        self.active.read().await.clone()
    }

    /// Returns the session registered for `server_name`
    pub async fn session(&self, server_name: &str) -> Option<Arc<RemoteSession>> {
        self.sessions.read().await.get(server_name).cloned()
    }

    /// Names of all registered servers
    pub async fn server_names(&self) -> Vec<String> {
        self.sessions.read().await.keys().cloned().collect()
    }

    /// Builds an exec closure bound to `server_name`, resolving the
    /// session through the registry at call time.
    ///
    /// This is the seam the pollers consume: if the session is gone or
    /// not Connected when a tick fires, that call returns an error the
    /// poller logs and skips. The closure itself never goes stale.
    #[must_use]
    pub fn exec_fn(
        &self,
        server_name: &str,
    ) -> impl Fn(String) -> BoxFuture<'static, Result<String, String>> + Send + Sync + Clone + use<>
    {
        let sessions = Arc::clone(&self.sessions);
        let server_name = server_name.to_string();

        move |command: String| {
            let sessions = Arc::clone(&sessions);
            let server_name = server_name.clone();

            Box::pin(async move {
                let session = sessions
                    .read()
                    .await
                    .get(&server_name)
                    .cloned()
                    .ok_or_else(|| SessionError::NoActiveSession.to_string())?;

                session
                    .exec_collect(&command)
                    .await
                    .map(|output| output.stdout)
                    .map_err(|e| e.to_string())
            })
        }
    }

    async fn active_session(&self) -> SessionResult<Arc<RemoteSession>> {
        let name = self
            .active
            .read()
            .await
            .clone()
            .ok_or(SessionError::NoActiveSession)?;

        let session = self
            .sessions
            .read()
            .await
            .get(&name)
            .cloned()
            .ok_or(SessionError::NoActiveSession)?;

        if session.state() != SessionState::Connected {
            return Err(SessionError::NoActiveSession);
        }
        Ok(session)
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Inserts `session` under its server name, disconnecting any session it
/// supersedes so the old transport is not leaked.
async fn register_session(sessions: &SessionMap, session: Arc<RemoteSession>) {
    let previous = sessions
        .write()
        .await
        .insert(session.name().to_string(), session);

    if let Some(previous) = previous {
        tracing::debug!(server = %previous.name(), "Superseding existing session");
        previous.disconnect().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn descriptor(name: &str) -> ServerDescriptor {
        ServerDescriptor {
            name: name.into(),
            host: "127.0.0.1".into(),
            port: 22,
            username: "ops".into(),
            password: Some(SecretString::from("pw")),
            services: Vec::new(),
        }
    }

    fn session(name: &str) -> Arc<RemoteSession> {
        Arc::new(RemoteSession::new(&descriptor(name)).unwrap())
    }

    #[tokio::test]
    async fn test_execute_without_session_fails_fast() {
        let manager = ConnectionManager::new();
        let result =
            tokio::time::timeout(Duration::from_millis(100), manager.execute("uptime")).await;
        let err = result.expect("execute must not block").unwrap_err();
        assert!(matches!(err, SessionError::NoActiveSession));
    }

    #[tokio::test]
    async fn test_reconnect_replaces_session() {
        let manager = ConnectionManager::new();

        let first = session("web-1");
        let second = session("web-1");
        register_session(&manager.sessions, Arc::clone(&first)).await;
        register_session(&manager.sessions, Arc::clone(&second)).await;

        let names = manager.server_names().await;
        assert_eq!(names, vec!["web-1".to_string()]);

        // The superseded session was disconnected, not leaked
        assert_eq!(first.state(), SessionState::Disconnected);
        let registered = manager.session("web-1").await.unwrap();
        assert!(Arc::ptr_eq(&registered, &second));
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let manager = ConnectionManager::new();
        register_session(&manager.sessions, session("web-1")).await;

        manager.disconnect("web-1").await;
        manager.disconnect("web-1").await;
        assert!(manager.session("web-1").await.is_none());
    }

    #[tokio::test]
    async fn test_disconnect_clears_active() {
        let manager = ConnectionManager::new();
        register_session(&manager.sessions, session("web-1")).await;
        manager.set_active("web-1").await.unwrap();
        assert_eq!(manager.active_server().await.as_deref(), Some("web-1"));

        manager.disconnect("web-1").await;
        assert!(manager.active_server().await.is_none());
    }

    #[tokio::test]
    async fn test_set_active_unknown_server() {
        let manager = ConnectionManager::new();
        let err = manager.set_active("nope").await.unwrap_err();
        assert!(matches!(err, SessionError::NoActiveSession));
    }

    #[tokio::test]
    async fn test_execute_on_unconnected_session_fails() {
        // A registered but Disconnected session must not receive commands.
        let manager = ConnectionManager::new();
        register_session(&manager.sessions, session("web-1")).await;
        manager.set_active("web-1").await.unwrap();

        let err = manager.execute("uptime").await.unwrap_err();
        assert!(matches!(err, SessionError::NoActiveSession));
    }

    #[tokio::test]
    async fn test_exec_fn_reports_missing_session() {
        let manager = ConnectionManager::new();
        let exec = manager.exec_fn("web-1");
        let err = exec("uptime".to_string()).await.unwrap_err();
        assert!(err.contains("No active session"));
    }

    #[tokio::test]
    async fn test_connect_failure_leaves_no_entry() {
        // Descriptor without a password is rejected before any network I/O.
        let mut server = descriptor("web-1");
        server.password = None;

        let manager = ConnectionManager::new();
        let mut events = manager.connect(server);

        let event = events.recv().await.expect("one event is delivered");
        assert!(matches!(event, ConnectionEvent::Failed { .. }));
        assert!(manager.server_names().await.is_empty());
        assert!(events.recv().await.is_none());
    }
}
