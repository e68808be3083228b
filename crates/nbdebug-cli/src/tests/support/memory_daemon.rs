//! In-memory [`DaemonClient`] that records each call with the paused-clock
//! time at which it happened.

use std::time::Duration;

use nbdebug_daemon_types::{BundleRequest, BundleResult, DaemonStatus, LogLevel, StatusSummary};
use tokio::time::Instant;

use crate::client::{DaemonClient, DaemonError};

/// A recorded daemon call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    pub(crate) op: String,
    pub(crate) at: Duration,
}

struct FailureRule {
    op: &'static str,
    occurrence: usize,
    /// `None` leaves the call waiting for a reply that never comes.
    message: Option<String>,
}

/// Stateful stand-in for the daemon.
pub(crate) struct MemoryDaemon {
    pub(crate) status: DaemonStatus,
    pub(crate) level: LogLevel,
    pub(crate) persistence: bool,
    pub(crate) bundle_result: BundleResult,
    calls: Vec<Call>,
    counts: Vec<(&'static str, usize)>,
    failures: Vec<FailureRule>,
    bundles: Vec<BundleRequest>,
    origin: Instant,
}

impl MemoryDaemon {
    pub(crate) fn new(status: DaemonStatus, level: LogLevel) -> Self {
        Self {
            status,
            level,
            persistence: false,
            bundle_result: BundleResult {
                path: String::from(super::BUNDLE_PATH),
                ..BundleResult::default()
            },
            calls: Vec::new(),
            counts: Vec::new(),
            failures: Vec::new(),
            bundles: Vec::new(),
            origin: Instant::now(),
        }
    }

    /// Makes the `occurrence`-th call (1-based) of `op` fail with `message`.
    pub(crate) fn fail(mut self, op: &'static str, occurrence: usize, message: &str) -> Self {
        self.failures.push(FailureRule {
            op,
            occurrence,
            message: Some(message.to_owned()),
        });
        self
    }

    /// Makes the `occurrence`-th call (1-based) of `op` hang forever.
    pub(crate) fn stall(mut self, op: &'static str, occurrence: usize) -> Self {
        self.failures.push(FailureRule {
            op,
            occurrence,
            message: None,
        });
        self
    }

    /// Operation names in call order, with arguments where they matter.
    pub(crate) fn ops(&self) -> Vec<&str> {
        self.calls.iter().map(|call| call.op.as_str()).collect()
    }

    pub(crate) fn calls(&self) -> &[Call] {
        &self.calls
    }

    pub(crate) fn bundles(&self) -> &[BundleRequest] {
        &self.bundles
    }

    /// The summary served by `get_status` for the current state.
    pub(crate) fn summary(&self) -> StatusSummary {
        StatusSummary {
            status: self.status,
            daemon_version: String::from("0.30.2"),
            ..StatusSummary::default()
        }
    }

    async fn record(&mut self, op: &'static str, label: String) -> Result<(), DaemonError> {
        self.calls.push(Call {
            op: label,
            at: self.origin.elapsed(),
        });

        let count = match self.counts.iter_mut().find(|(name, _)| *name == op) {
            Some((_, count)) => {
                *count += 1;
                *count
            }
            None => {
                self.counts.push((op, 1));
                1
            }
        };

        let rule = self
            .failures
            .iter()
            .find(|rule| rule.op == op && rule.occurrence == count);
        match rule.map(|rule| rule.message.clone()) {
            Some(Some(message)) => Err(DaemonError::Rejected { message }),
            Some(None) => std::future::pending().await,
            None => Ok(()),
        }
    }
}

impl DaemonClient for MemoryDaemon {
    async fn status(&mut self) -> Result<StatusSummary, DaemonError> {
        self.record("get_status", String::from("get_status")).await?;
        Ok(self.summary())
    }

    async fn log_level(&mut self) -> Result<LogLevel, DaemonError> {
        self.record("get_log_level", String::from("get_log_level")).await?;
        Ok(self.level)
    }

    async fn set_log_level(&mut self, level: LogLevel) -> Result<(), DaemonError> {
        self.record("set_log_level", format!("set_log_level({level})"))
            .await?;
        self.level = level;
        Ok(())
    }

    async fn up(&mut self) -> Result<(), DaemonError> {
        self.record("up", String::from("up")).await?;
        self.status = DaemonStatus::Connected;
        Ok(())
    }

    async fn down(&mut self) -> Result<(), DaemonError> {
        self.record("down", String::from("down")).await?;
        self.status = DaemonStatus::Idle;
        Ok(())
    }

    async fn set_network_map_persistence(&mut self, enabled: bool) -> Result<(), DaemonError> {
        self.record(
            "set_network_map_persistence",
            format!("set_network_map_persistence({enabled})"),
        )
        .await?;
        self.persistence = enabled;
        Ok(())
    }

    async fn debug_bundle(&mut self, request: BundleRequest) -> Result<BundleResult, DaemonError> {
        self.record("debug_bundle", String::from("debug_bundle")).await?;
        self.bundles.push(request);
        Ok(self.bundle_result.clone())
    }
}
