//! Wire types exchanged between the `nbdebug` console and the Netbird daemon.
//!
//! Requests and responses travel as one JSON object per line. The types here
//! carry no behaviour beyond small classification helpers so both sides of the
//! socket can depend on them without pulling in transport concerns.

mod bundle;
mod log_level;
mod protocol;
mod status;

pub use bundle::{BundleRequest, BundleResult};
pub use log_level::{LogLevel, LogLevelParseError};
pub use protocol::{DaemonRequest, DaemonResponse};
pub use status::{
    DaemonStatus, LocalPeerState, PeerConnectionStatus, PeerState, ServiceState, StatusSummary,
};
