//! A single authenticated SSH session bound to one server
//!
//! Every command execution opens its own channel on the multiplexed
//! transport, so concurrent commands on the same session never share
//! framing. Long-running streams (`tail -f`, `journalctl -fu`) are just
//! commands whose stdout keeps flowing.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use russh::client::{self, Config, Handle};
use russh::{ChannelMsg, Disconnect};
use russh_keys::key::PublicKey;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{RwLock, mpsc, oneshot};

use crate::config::ServerDescriptor;
use crate::error::{SessionError, SessionResult};

/// Capacity of the per-command stdout/stderr chunk channels.
///
/// Chunks arrive at SSH packet granularity; 64 gives enough headroom for
/// a bursty `tail -f` without the forwarding task outpacing a slow
/// subscriber unboundedly.
const EXEC_CHANNEL_CAPACITY: usize = 64;

/// Connection state of a [`RemoteSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    /// No transport established
    Disconnected = 0,
    /// Handshake/authentication in progress
    Connecting = 1,
    /// Authenticated and usable
    Connected = 2,
    /// The last connection attempt failed
    Failed = 3,
}

impl SessionState {
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Connected,
            3 => Self::Failed,
            _ => Self::Disconnected,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Streams of a single in-flight command execution.
///
/// Dropping the handle drops the receivers; the forwarding task then stops
/// delivering and the channel is torn down with the command.
#[derive(Debug)]
pub struct ExecHandle {
    /// Raw stdout chunks in arrival order
    pub stdout: mpsc::Receiver<Vec<u8>>,
    /// Raw stderr chunks in arrival order
    pub stderr: mpsc::Receiver<Vec<u8>>,
    /// Resolves with the remote exit status, if the server reports one
    pub exit: oneshot::Receiver<u32>,
}

impl ExecHandle {
    /// Consumes the handle, keeping only the stdout chunk stream.
    ///
    /// This is the shape the log tailer consumes; stderr and the exit
    /// status are discarded.
    #[must_use]
    pub fn into_stream(self) -> mpsc::Receiver<Vec<u8>> {
        self.stdout
    }

    /// Drains the command to completion and collects its output.
    pub async fn collect(mut self) -> CommandOutput {
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut stdout_open = true;
        let mut stderr_open = true;

        while stdout_open || stderr_open {
            tokio::select! {
                chunk = self.stdout.recv(), if stdout_open => match chunk {
                    Some(c) => stdout.extend_from_slice(&c),
                    None => stdout_open = false,
                },
                chunk = self.stderr.recv(), if stderr_open => match chunk {
                    Some(c) => stderr.extend_from_slice(&c),
                    None => stderr_open = false,
                },
            }
        }

        CommandOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
            exit_status: self.exit.await.ok(),
        }
    }
}

/// Collected output of a completed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Full stdout, lossily decoded as UTF-8
    pub stdout: String,
    /// Full stderr, lossily decoded as UTF-8
    pub stderr: String,
    /// Remote exit status, when the server reported one
    pub exit_status: Option<u32>,
}

impl CommandOutput {
    /// Returns `true` if the command exited with status 0
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_status == Some(0)
    }
}

/// One authenticated SSH transport to a single server.
///
/// The session is created Disconnected and driven to Connected (or
/// Failed) by [`Self::establish`]. The [`super::ConnectionManager`]
/// guarantees at most one instance per server name.
pub struct RemoteSession {
    /// Server name (registry key)
    name: String,
    host: String,
    port: u16,
    username: String,
    /// Login password, also used for piped privilege escalation
    password: SecretString,
    state: AtomicU8,
    handle: RwLock<Option<Handle<ClientHandler>>>,
}

impl RemoteSession {
    /// Creates a Disconnected session for `server`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingCredentials`] when the descriptor
    /// carries no password.
    pub fn new(server: &ServerDescriptor) -> SessionResult<Self> {
        let password = server
            .password
            .clone()
            .ok_or_else(|| SessionError::MissingCredentials(server.name.clone()))?;

        Ok(Self {
            name: server.name.clone(),
            host: server.host.clone(),
            port: server.port,
            username: server.username.clone(),
            password,
            state: AtomicU8::new(SessionState::Disconnected as u8),
            handle: RwLock::new(None),
        })
    }

    /// Server name this session is bound to
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current connection state
    #[must_use]
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: SessionState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    /// Password held for this session (exposed only to the elevation pipe)
    pub(crate) fn password(&self) -> &SecretString {
        &self.password
    }

    /// Connects and authenticates, bounded by `timeout`.
    ///
    /// Transitions Connecting → Connected on success, Connecting → Failed
    /// on any error. Never retried automatically; retry is an explicit
    /// re-`connect` by the operator.
    ///
    /// # Errors
    ///
    /// [`SessionError::Timeout`] when the deadline elapses,
    /// [`SessionError::AuthenticationFailed`] when the server rejects the
    /// credentials, [`SessionError::ConnectFailed`] for handshake and
    /// network errors.
    pub async fn establish(&self, timeout: Duration) -> SessionResult<()> {
        self.set_state(SessionState::Connecting);

        match self.try_connect(timeout).await {
            Ok(handle) => {
                *self.handle.write().await = Some(handle);
                self.set_state(SessionState::Connected);
                Ok(())
            }
            Err(e) => {
                self.set_state(SessionState::Failed);
                Err(e)
            }
        }
    }

    async fn try_connect(&self, timeout: Duration) -> SessionResult<Handle<ClientHandler>> {
        let config = Arc::new(Config::default());
        let handler = ClientHandler {
            server: self.name.clone(),
        };

        tracing::debug!(server = %self.name, host = %self.host, port = self.port, "Connecting");
        let mut handle = tokio::time::timeout(
            timeout,
            client::connect(config, (self.host.as_str(), self.port), handler),
        )
        .await
        .map_err(|_| SessionError::Timeout(timeout.as_secs()))?
        .map_err(|e| SessionError::ConnectFailed(e.to_string()))?;

        tracing::debug!(server = %self.name, user = %self.username, "Authenticating");
        let authenticated = handle
            .authenticate_password(&self.username, self.password.expose_secret())
            .await
            .map_err(|e| SessionError::ConnectFailed(e.to_string()))?;

        if !authenticated {
            return Err(SessionError::AuthenticationFailed(self.name.clone()));
        }

        Ok(handle)
    }

    /// Executes `command` on a fresh channel and returns its streams.
    ///
    /// # Errors
    ///
    /// [`SessionError::Disconnected`] when the session is not Connected,
    /// [`SessionError::ChannelOpen`] / [`SessionError::Transport`] for
    /// transport failures.
    pub async fn exec(&self, command: &str) -> SessionResult<ExecHandle> {
        self.exec_inner(command, None).await
    }

    /// Executes `command`, writing `input` to its stdin before reading.
    ///
    /// Used for privilege escalation: the secret travels over the channel,
    /// never inside the command text.
    ///
    /// # Errors
    ///
    /// Same as [`Self::exec`].
    pub async fn exec_with_input(&self, command: &str, input: &[u8]) -> SessionResult<ExecHandle> {
        self.exec_inner(command, Some(input)).await
    }

    async fn exec_inner(&self, command: &str, input: Option<&[u8]>) -> SessionResult<ExecHandle> {
        if self.state() != SessionState::Connected {
            return Err(SessionError::Disconnected);
        }

        // The lock covers only the channel open; once the channel exists
        // it is independent of every other command on this session.
        let mut guard = self.handle.write().await;
        let handle = guard.as_mut().ok_or(SessionError::Disconnected)?;

        let mut channel = handle
            .channel_open_session()
            .await
            .map_err(|e| SessionError::ChannelOpen(e.to_string()))?;
        drop(guard);

        channel
            .exec(true, command)
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        if let Some(data) = input {
            channel
                .data(data)
                .await
                .map_err(|e| SessionError::Transport(e.to_string()))?;
            channel
                .eof()
                .await
                .map_err(|e| SessionError::Transport(e.to_string()))?;
        }

        let (stdout_tx, stdout_rx) = mpsc::channel(EXEC_CHANNEL_CAPACITY);
        let (stderr_tx, stderr_rx) = mpsc::channel(EXEC_CHANNEL_CAPACITY);
        let (exit_tx, exit_rx) = oneshot::channel();

        tokio::spawn(async move {
            let mut exit_tx = Some(exit_tx);
            // A dropped receiver only mutes its own stream; the channel is
            // torn down once every data subscriber is gone, releasing the
            // remote command even when it produces no further output.
            let mut stdout_tx = Some(stdout_tx);
            let mut stderr_tx = Some(stderr_tx);

            loop {
                tokio::select! {
                    msg = channel.wait() => {
                        let Some(msg) = msg else { break };
                        match msg {
                            ChannelMsg::Data { ref data } => {
                                if let Some(tx) = &stdout_tx {
                                    if tx.send(data.to_vec()).await.is_err() {
                                        stdout_tx = None;
                                    }
                                }
                            }
                            ChannelMsg::ExtendedData { ref data, ext: 1 } => {
                                if let Some(tx) = &stderr_tx {
                                    if tx.send(data.to_vec()).await.is_err() {
                                        stderr_tx = None;
                                    }
                                }
                            }
                            ChannelMsg::ExitStatus { exit_status } => {
                                if let Some(tx) = exit_tx.take() {
                                    let _ = tx.send(exit_status);
                                }
                            }
                            ChannelMsg::Close => break,
                            _ => {}
                        }
                    }
                    () = subscribers_gone(stdout_tx.clone(), stderr_tx.clone()) => break,
                }
            }
        });

        Ok(ExecHandle {
            stdout: stdout_rx,
            stderr: stderr_rx,
            exit: exit_rx,
        })
    }

    /// Executes `command` and collects its full output.
    ///
    /// # Errors
    ///
    /// Same as [`Self::exec`].
    pub async fn exec_collect(&self, command: &str) -> SessionResult<CommandOutput> {
        let handle = self.exec(command).await?;
        Ok(handle.collect().await)
    }

    /// Tears down the transport. Idempotent.
    pub async fn disconnect(&self) {
        if let Some(handle) = self.handle.write().await.take() {
            if let Err(e) = handle
                .disconnect(Disconnect::ByApplication, "closing", "en")
                .await
            {
                tracing::debug!(server = %self.name, error = %e, "Disconnect notification failed");
            }
        }
        self.set_state(SessionState::Disconnected);
    }
}

impl std::fmt::Debug for RemoteSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSession")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Resolves once both chunk receivers have been dropped.
async fn subscribers_gone(
    stdout_tx: Option<mpsc::Sender<Vec<u8>>>,
    stderr_tx: Option<mpsc::Sender<Vec<u8>>>,
) {
    let closed = |tx: Option<mpsc::Sender<Vec<u8>>>| async move {
        match tx {
            Some(tx) => tx.closed().await,
            None => {}
        }
    };
    tokio::join!(closed(stdout_tx), closed(stderr_tx));
}

/// SSH client handler for a session.
///
/// Host keys are accepted and their fingerprint logged; the inventory is
/// operator-curated and host key pinning is not part of the trust model.
struct ClientHandler {
    server: String,
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = SessionError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        tracing::debug!(
            server = %self.server,
            fingerprint = %server_public_key.fingerprint(),
            "Accepting host key"
        );
        Ok(true)
    }
}
