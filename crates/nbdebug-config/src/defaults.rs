use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// Default TCP port used when Unix domain sockets are not available.
pub const DEFAULT_TCP_PORT: u16 = 41731;

/// Socket path the Netbird daemon binds on Unix hosts.
pub const DEFAULT_UNIX_SOCKET: &str = "/var/run/netbird.sock";

/// Default log filter expression used by the console.
///
/// The console shares the terminal with operator-facing output, so only
/// warnings and errors are logged unless the operator asks for more.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Default log filter expression used by the console.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the console.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Computes the default socket endpoint for the daemon.
#[must_use]
pub fn default_socket_endpoint() -> SocketEndpoint {
    default_socket_endpoint_inner()
}

#[cfg(unix)]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    SocketEndpoint::unix(DEFAULT_UNIX_SOCKET)
}

#[cfg(not(unix))]
fn default_socket_endpoint_inner() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", DEFAULT_TCP_PORT)
}
