//! Timestamped status captures embedded into the bundle's status report.

use std::fmt;
use std::io;
use std::time::Duration;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

use super::Clock;
use crate::Console;
use crate::client::DaemonClient;
use crate::status::render_full_detail;

/// Point in the session at which a snapshot was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SnapshotLabel {
    PostUp,
    PreDown,
}

impl fmt::Display for SnapshotLabel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::PostUp => "post-up",
            Self::PreDown => "pre-down",
        })
    }
}

/// One captured status text with its header fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StatusSnapshot {
    label: SnapshotLabel,
    taken_at: OffsetDateTime,
    session_duration: Option<Duration>,
    text: String,
}

impl StatusSnapshot {
    pub(crate) fn header(&self) -> String {
        let timestamp = format_timestamp(self.taken_at);
        match self.session_duration {
            Some(duration) => format!(
                "----- Netbird {} - Timestamp: {timestamp} - Duration: {}",
                self.label,
                humantime::format_duration(duration)
            ),
            None => format!("----- Netbird {} - Timestamp: {timestamp}", self.label),
        }
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    /// Header line followed by the status text.
    pub(crate) fn render(&self) -> String {
        format!("{}\n{}", self.header(), self.text)
    }
}

/// Whole-second RFC3339, falling back to the default rendering for dates
/// RFC3339 cannot express.
fn format_timestamp(at: OffsetDateTime) -> String {
    let at = at.replace_nanosecond(0).unwrap_or(at);
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

/// Snapshots in capture order.
#[derive(Debug, Default)]
pub(crate) struct StatusReport {
    snapshots: Vec<StatusSnapshot>,
}

impl StatusReport {
    pub(crate) fn push(&mut self, snapshot: StatusSnapshot) {
        self.snapshots.push(snapshot);
    }

    /// Joins the rendered snapshots with newlines.
    pub(crate) fn into_text(self) -> String {
        self.snapshots
            .iter()
            .map(StatusSnapshot::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Fetches and renders the daemon status, substituting empty text when the
/// daemon cannot answer.
pub(crate) async fn fetch_status_text<C: DaemonClient>(
    client: &mut C,
    anonymize: bool,
    console: &Console,
) -> io::Result<String> {
    match client.status().await {
        Ok(summary) => Ok(render_full_detail(&summary, anonymize)),
        Err(error) => {
            warn!(%error, "status unavailable, continuing without it");
            console.eprintln(format_args!("Failed to get status: {error}"))?;
            Ok(String::new())
        }
    }
}

/// Takes a labelled snapshot. The timestamp is read before the fetch.
pub(crate) async fn capture<C: DaemonClient>(
    client: &mut C,
    label: SnapshotLabel,
    session_duration: Option<Duration>,
    anonymize: bool,
    clock: &dyn Clock,
    console: &Console,
) -> io::Result<StatusSnapshot> {
    let taken_at = clock.now();
    let text = fetch_status_text(client, anonymize, console).await?;
    Ok(StatusSnapshot {
        label,
        taken_at,
        session_duration,
        text,
    })
}
