//! Layered configuration for the `nbdebug` console.
//!
//! Values resolve from built-in defaults, then an optional configuration file
//! (`--config-path` or `NBDEBUG_CONFIG_PATH`), then `NBDEBUG_*` environment
//! variables, and finally command-line flags. Only settings that describe how
//! the console reaches the daemon and how it logs live here; per-command
//! options such as bundle upload flags are parsed by the CLI itself.

mod defaults;
mod logging;
mod socket;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_TCP_PORT, DEFAULT_UNIX_SOCKET, default_log_filter,
    default_log_filter_string, default_log_format, default_socket_endpoint,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError};

/// Resolved console configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "NBDEBUG")]
pub struct Config {
    /// Socket the Netbird daemon listens on.
    #[serde(default = "default_socket_endpoint")]
    #[ortho_config(default = default_socket_endpoint())]
    pub daemon_socket: SocketEndpoint,
    /// `tracing` filter expression for console diagnostics.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for console diagnostics.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            daemon_socket: default_socket_endpoint(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Socket the daemon listens on.
    #[must_use]
    pub const fn daemon_socket(&self) -> &SocketEndpoint {
        &self.daemon_socket
    }

    /// Filter expression for diagnostics.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Output format for diagnostics.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
