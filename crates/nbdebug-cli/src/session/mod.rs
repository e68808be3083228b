//! The timed debug session and the pieces it is assembled from.
//!
//! A session captures the daemon's connectivity and log level, forces a
//! verbose reconnect cycle, waits for the requested duration while the daemon
//! logs at trace, then asks the daemon for a bundle and puts back what it
//! changed. The bundle helpers are shared with the one-shot `bundle` command.

pub(crate) mod bundle;
pub(crate) mod orchestrator;
pub(crate) mod snapshot;
mod state;
pub(crate) mod waiter;

use std::io;

use thiserror::Error;
use time::OffsetDateTime;

use crate::client::DaemonError;

pub(crate) use orchestrator::DebugSession;

/// Service the daemon asks for an upload target when none is configured.
pub(crate) const DEFAULT_UPLOAD_URL: &str = "https://upload.debug.netbird.io/upload-url";

/// Bundle options shared by the `bundle` and `for` commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DebugOptions {
    pub(crate) log_file_count: u32,
    pub(crate) system_info: bool,
    pub(crate) upload_bundle: bool,
    pub(crate) upload_url: String,
    pub(crate) anonymize: bool,
}

impl Default for DebugOptions {
    fn default() -> Self {
        Self {
            log_file_count: 1,
            system_info: true,
            upload_bundle: false,
            upload_url: DEFAULT_UPLOAD_URL.to_owned(),
            anonymize: false,
        }
    }
}

/// Failures that end a debug session or bundle command.
#[derive(Debug, Error)]
pub(crate) enum SessionError {
    #[error("failed to get status: {0}")]
    GetStatus(#[source] DaemonError),
    #[error("failed to get log level: {0}")]
    GetLogLevel(#[source] DaemonError),
    #[error("failed to up: {0}")]
    Up(#[source] DaemonError),
    #[error("failed to down: {0}")]
    Down(#[source] DaemonError),
    #[error("failed to set log level to TRACE: {0}")]
    Elevate(#[source] DaemonError),
    #[error("failed to enable network map persistence: {0}")]
    EnablePersistence(#[source] DaemonError),
    #[error("failed to bundle debug: {0}")]
    Bundle(#[source] DaemonError),
    #[error("failed to restore log level: {0}")]
    RestoreLogLevel(#[source] DaemonError),
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("daemon state was not fully restored ({failures} step(s) failed)")]
    RestoreIncomplete { failures: usize },
    #[error("debug session cancelled")]
    Cancelled,
    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

/// Source of wall-clock timestamps for snapshot headers.
pub(crate) trait Clock {
    fn now(&self) -> OffsetDateTime;
}

/// Clock backed by the system time in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}
