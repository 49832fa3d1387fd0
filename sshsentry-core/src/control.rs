//! Remote service control
//!
//! Runs `systemctl start/stop/restart` on the session's server. The
//! elevation uses `sudo -S` with the session password written to the
//! channel's stdin: the secret travels over the encrypted transport and
//! never appears in the command text, argv, or remote shell history.

use secrecy::ExposeSecret;

use crate::connection::{CommandOutput, RemoteSession};
use crate::error::SessionResult;

/// A privileged lifecycle operation on a systemd unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    /// `systemctl start`
    Start,
    /// `systemctl stop`
    Stop,
    /// `systemctl restart`
    Restart,
}

impl ServiceAction {
    /// The systemctl verb for this action
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
        }
    }
}

impl std::fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.verb())
    }
}

/// Builds the elevated command line for `action` on `service`.
///
/// `-S` reads the password from stdin, `-p ''` suppresses the prompt so
/// it does not interleave with command output.
fn control_command(action: ServiceAction, service: &str) -> String {
    format!("sudo -S -p '' systemctl {} {}", action.verb(), service)
}

/// Executes a privileged service action on `session`'s server.
///
/// Returns the collected command output; a non-zero exit status is
/// reported through [`CommandOutput::exit_status`], not as an error.
///
/// # Errors
///
/// Transport-level failures from the session
/// ([`crate::SessionError::Disconnected`],
/// [`crate::SessionError::ChannelOpen`],
/// [`crate::SessionError::Transport`]).
pub async fn control_service(
    session: &RemoteSession,
    action: ServiceAction,
    service: &str,
) -> SessionResult<CommandOutput> {
    let command = control_command(action, service);
    tracing::info!(server = %session.name(), service, action = %action, "Service control");

    // Password + newline, exactly what `sudo -S` reads from stdin.
    let mut input = session.password().expose_secret().as_bytes().to_vec();
    input.push(b'\n');

    match session.exec_with_input(&command, &input).await {
        Ok(handle) => Ok(handle.collect().await),
        Err(e) => {
            tracing::warn!(
                server = %session.name(),
                service,
                action = %action,
                error = %e,
                "Service control failed"
            );
            Err(e)
        }
    }
}

/// Checks whether `service` is active on `session`'s server.
///
/// Unprivileged probe; returns the raw boolean without touching sudo.
///
/// # Errors
///
/// Transport-level failures from the session.
pub async fn is_service_active(session: &RemoteSession, service: &str) -> SessionResult<bool> {
    let output = session
        .exec_collect(&format!("systemctl is-active {service}"))
        .await?;
    Ok(output.stdout.trim() == "active")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_command_shape() {
        let cmd = control_command(ServiceAction::Restart, "nginx");
        assert_eq!(cmd, "sudo -S -p '' systemctl restart nginx");
    }

    #[test]
    fn test_command_never_embeds_a_secret() {
        // The command text is fully determined by action and service; the
        // password travels on stdin only.
        for action in [
            ServiceAction::Start,
            ServiceAction::Stop,
            ServiceAction::Restart,
        ] {
            let cmd = control_command(action, "app");
            assert!(cmd.starts_with("sudo -S -p ''"));
            assert!(!cmd.contains("echo"));
        }
    }

    #[test]
    fn test_action_verbs() {
        assert_eq!(ServiceAction::Start.verb(), "start");
        assert_eq!(ServiceAction::Stop.to_string(), "stop");
        assert_eq!(ServiceAction::Restart.to_string(), "restart");
    }
}
