use nbdebug_daemon_types::LogLevel;

use super::SessionError;
use crate::client::DaemonClient;

/// Daemon state recorded before a session changes anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SessionState {
    was_disconnected: bool,
    initial_log_level: LogLevel,
}

impl SessionState {
    /// Reads connectivity, then the log level. Either failure is fatal since
    /// restoring to a guessed state is worse than not starting.
    pub(crate) async fn capture<C: DaemonClient>(client: &mut C) -> Result<Self, SessionError> {
        let summary = client.status().await.map_err(SessionError::GetStatus)?;
        let initial_log_level = client.log_level().await.map_err(SessionError::GetLogLevel)?;
        Ok(Self {
            was_disconnected: !summary.status.is_up(),
            initial_log_level,
        })
    }

    #[cfg(test)]
    pub(crate) const fn new(was_disconnected: bool, initial_log_level: LogLevel) -> Self {
        Self {
            was_disconnected,
            initial_log_level,
        }
    }

    pub(crate) const fn was_disconnected(self) -> bool {
        self.was_disconnected
    }

    pub(crate) const fn initial_log_level(self) -> LogLevel {
        self.initial_log_level
    }

    /// True when the daemon logs below maximum verbosity.
    pub(crate) const fn needs_elevation(self) -> bool {
        !self.initial_log_level.is_max_verbosity()
    }
}
