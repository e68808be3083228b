//! Human-readable rendering of the daemon's status summary.
//!
//! The "full detail" layout is what gets embedded into debug bundles, so it
//! favours completeness over brevity: one block per peer followed by the
//! daemon-wide facts.

mod anonymize;

use std::fmt::Write as _;

use nbdebug_daemon_types::{PeerConnectionStatus, PeerState, ServiceState, StatusSummary};

pub(crate) use anonymize::Anonymizer;

const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Renders `summary` in full detail, optionally anonymising identifying data.
pub(crate) fn render_full_detail(summary: &StatusSummary, anonymize: bool) -> String {
    if anonymize {
        let anonymised = Anonymizer::new().summary(summary);
        render(&anonymised, CLI_VERSION)
    } else {
        render(summary, CLI_VERSION)
    }
}

fn render(summary: &StatusSummary, cli_version: &str) -> String {
    let mut output = String::from("Peers detail:\n");
    for peer in &summary.peers {
        render_peer(&mut output, peer);
    }

    let local = &summary.local_peer;
    let interface = if local.kernel_interface {
        "Kernel"
    } else {
        "Userspace"
    };
    let _ = writeln!(output, "Daemon version: {}", summary.daemon_version);
    let _ = writeln!(output, "CLI version: {cli_version}");
    let _ = writeln!(output, "Management: {}", service_line(&summary.management));
    let _ = writeln!(output, "Signal: {}", service_line(&summary.signal));
    let _ = writeln!(output, "FQDN: {}", local.fqdn);
    let _ = writeln!(output, "NetBird IP: {}", local.ip);
    let _ = writeln!(output, "Interface type: {interface}");
    let _ = writeln!(
        output,
        "Peers count: {}/{} Connected",
        summary.connected_peers(),
        summary.peers.len()
    );
    output
}

fn render_peer(output: &mut String, peer: &PeerState) {
    let connected = peer.status == PeerConnectionStatus::Connected;
    let connection_type = match (connected, peer.relayed) {
        (false, _) => "-",
        (true, true) => "Relayed",
        (true, false) => "P2P",
    };
    let local = peer.local_endpoint.as_deref().unwrap_or("-");
    let remote = peer.remote_endpoint.as_deref().unwrap_or("-");
    let handshake = peer.last_handshake.as_deref().unwrap_or("-");
    let latency = peer
        .latency_ms
        .map_or_else(|| String::from("-"), |ms| format!("{ms}ms"));

    let _ = writeln!(output, " {}:", peer.fqdn);
    let _ = writeln!(output, "  NetBird IP: {}", peer.ip);
    let _ = writeln!(output, "  Status: {}", peer.status);
    output.push_str("  -- detail --\n");
    let _ = writeln!(output, "  Connection type: {connection_type}");
    let _ = writeln!(output, "  Endpoints (Local/Remote): {local}/{remote}");
    let _ = writeln!(output, "  Last WireGuard handshake: {handshake}");
    let _ = writeln!(
        output,
        "  Transfer status (received/sent) {}/{}",
        format_bytes(peer.bytes_rx),
        format_bytes(peer.bytes_tx)
    );
    let _ = writeln!(output, "  Latency: {latency}");
    output.push('\n');
}

fn service_line(service: &ServiceState) -> String {
    match (&service.error, service.connected) {
        (_, true) => format!("Connected to {}", service.url),
        (Some(reason), false) if !reason.is_empty() => {
            format!("Disconnected from {}, reason: {reason}", service.url)
        }
        (_, false) => format!("Disconnected from {}", service.url),
    }
}

/// Formats a byte count with IEC units and one decimal place.
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }

    let mut divisor: u128 = 1024;
    let mut unit = 0usize;
    while u128::from(bytes) / divisor >= 1024 && unit + 1 < UNITS.len() {
        divisor *= 1024;
        unit += 1;
    }
    let tenths = (u128::from(bytes) * 10 + divisor / 2) / divisor;
    let name = UNITS.get(unit).copied().unwrap_or("EiB");
    format!("{}.{} {name}", tenths / 10, tenths % 10)
}
