use serde::{Deserialize, Serialize};
use strum::Display;

/// Overall connectivity state reported by the daemon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum DaemonStatus {
    /// Not connected and not trying to connect.
    #[default]
    Idle,
    /// Establishing the management connection.
    Connecting,
    /// Fully connected to the network.
    Connected,
    /// The daemon requires an interactive login.
    NeedsLogin,
    /// The last login attempt failed.
    LoginFailed,
    /// The login session expired.
    SessionExpired,
    /// A state this client does not recognise.
    #[serde(other)]
    Unknown,
}

impl DaemonStatus {
    /// Returns true when the daemon is connected or on its way there.
    #[must_use]
    pub const fn is_up(self) -> bool {
        matches!(self, Self::Connected | Self::Connecting)
    }
}

/// Connection state of a control-plane service (management or signal).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ServiceState {
    /// Service URL.
    pub url: String,
    /// Whether the daemon currently holds a connection to the service.
    pub connected: bool,
    /// Last error reported for the service, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Identity of the local peer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LocalPeerState {
    /// Fully qualified domain name inside the overlay network.
    pub fqdn: String,
    /// Overlay address in CIDR notation.
    pub ip: String,
    /// WireGuard public key.
    pub public_key: String,
    /// Whether the kernel WireGuard module backs the interface.
    pub kernel_interface: bool,
}

/// Connection status of a remote peer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum PeerConnectionStatus {
    /// No tunnel to the peer.
    #[default]
    Idle,
    /// Tunnel negotiation in progress.
    Connecting,
    /// Tunnel established.
    Connected,
}

/// Snapshot of a remote peer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PeerState {
    /// Peer FQDN.
    pub fqdn: String,
    /// Peer overlay address.
    pub ip: String,
    /// Tunnel state.
    pub status: PeerConnectionStatus,
    /// Whether traffic goes through a relay.
    #[serde(default)]
    pub relayed: bool,
    /// Local ICE endpoint, when connected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_endpoint: Option<String>,
    /// Remote ICE endpoint, when connected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_endpoint: Option<String>,
    /// Last WireGuard handshake as reported by the daemon (RFC3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_handshake: Option<String>,
    /// Measured latency in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    /// Bytes received from the peer.
    #[serde(default)]
    pub bytes_rx: u64,
    /// Bytes sent to the peer.
    #[serde(default)]
    pub bytes_tx: u64,
}

/// Point-in-time status summary returned by `get_status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StatusSummary {
    /// Overall connectivity.
    pub status: DaemonStatus,
    /// Daemon build version.
    #[serde(default)]
    pub daemon_version: String,
    /// Management service state.
    #[serde(default)]
    pub management: ServiceState,
    /// Signal service state.
    #[serde(default)]
    pub signal: ServiceState,
    /// Local peer identity.
    #[serde(default)]
    pub local_peer: LocalPeerState,
    /// Remote peers known to the daemon.
    #[serde(default)]
    pub peers: Vec<PeerState>,
}

impl StatusSummary {
    /// Number of peers with an established tunnel.
    #[must_use]
    pub fn connected_peers(&self) -> usize {
        self.peers
            .iter()
            .filter(|peer| peer.status == PeerConnectionStatus::Connected)
            .count()
    }
}
