use serde::{Deserialize, Serialize};

use crate::{BundleRequest, BundleResult, LogLevel, StatusSummary};

/// Operation requested from the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DaemonRequest {
    /// Fetch the current status summary.
    GetStatus,
    /// Fetch the active log level.
    GetLogLevel,
    /// Change the active log level until the daemon restarts.
    SetLogLevel {
        /// Level to apply.
        level: LogLevel,
    },
    /// Bring the network connection up.
    Up,
    /// Tear the network connection down.
    Down,
    /// Toggle in-memory persistence of the last network map.
    SetNetworkMapPersistence {
        /// Whether the map should persist.
        enabled: bool,
    },
    /// Produce a debug bundle.
    DebugBundle(BundleRequest),
}

impl DaemonRequest {
    /// Wire name of the operation, used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GetStatus => "get_status",
            Self::GetLogLevel => "get_log_level",
            Self::SetLogLevel { .. } => "set_log_level",
            Self::Up => "up",
            Self::Down => "down",
            Self::SetNetworkMapPersistence { .. } => "set_network_map_persistence",
            Self::DebugBundle(_) => "debug_bundle",
        }
    }
}

/// Reply to a [`DaemonRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DaemonResponse {
    /// The operation succeeded and carries no payload.
    Ack,
    /// Reply to `get_status`.
    Status {
        /// The status summary.
        summary: StatusSummary,
    },
    /// Reply to `get_log_level`.
    LogLevel {
        /// The active level.
        level: LogLevel,
    },
    /// Reply to `debug_bundle`.
    Bundle {
        /// The generated bundle.
        result: BundleResult,
    },
    /// The daemon rejected the operation.
    Error {
        /// Human-readable failure reported by the daemon.
        message: String,
    },
}

impl DaemonResponse {
    /// Wire name of the response kind, used in diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Ack => "ack",
            Self::Status { .. } => "status",
            Self::LogLevel { .. } => "log_level",
            Self::Bundle { .. } => "bundle",
            Self::Error { .. } => "error",
        }
    }
}
