//! The `for <duration>` workflow.
//!
//! The session records the daemon's connectivity and log level, connects if
//! needed, raises verbosity to trace, cycles the connection with network-map
//! persistence enabled, and snapshots status on either side of the timed
//! wait. After the bundle is produced it undoes the connection and log-level
//! changes, using only the values recorded at the start.
//!
//! A failing step aborts the remainder without rolling back earlier steps.
//! Cancellation is observed during every pause and every daemon call, and
//! skips whatever restoration has not happened yet. In both cases the
//! operator is told what was left changed. Persistence is never switched
//! back off.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use nbdebug_daemon_types::{BundleResult, LogLevel};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::bundle::{build_request, generate, report};
use super::snapshot::{SnapshotLabel, StatusReport, StatusSnapshot, capture};
use super::state::SessionState;
use super::waiter::{
    WaitOutcome, format_remaining, or_cancel, pause, wait_for_duration_or_cancel,
};
use super::{Clock, DebugOptions, SessionError};
use crate::Console;
use crate::client::{DaemonClient, DaemonError};

/// Settle time after connecting a daemon that started disconnected.
pub(crate) const CONNECT_GRACE: Duration = Duration::from_secs(10);
/// Settle time after the forced disconnect.
pub(crate) const DISCONNECT_SETTLE: Duration = Duration::from_secs(1);
/// Settle time after the forced reconnect, before the first snapshot.
pub(crate) const RECONNECT_SETTLE: Duration = Duration::from_secs(3);

/// Daemon state the session has changed so far.
#[derive(Debug, Clone, Copy)]
struct Changes {
    initial: SessionState,
    connected: bool,
    elevated: bool,
    persistence_enabled: bool,
}

impl Changes {
    const fn new(initial: SessionState) -> Self {
        Self {
            initial,
            connected: !initial.was_disconnected(),
            elevated: false,
            persistence_enabled: false,
        }
    }

    /// Human-readable list of differences from the recorded state.
    fn leftovers(&self) -> Vec<String> {
        let mut leftovers = Vec::new();
        if self.connected == self.initial.was_disconnected() {
            leftovers.push(String::from(if self.connected {
                "connection is up (it was down before the session)"
            } else {
                "connection is down (it was up before the session)"
            }));
        }
        if self.elevated {
            leftovers.push(format!(
                "log level is {} (was {})",
                LogLevel::MAX_VERBOSITY,
                self.initial.initial_log_level()
            ));
        }
        if self.persistence_enabled {
            leftovers.push(String::from("network map persistence is enabled"));
        }
        leftovers
    }
}

/// One run of the timed debug workflow against a connected daemon.
pub(crate) struct DebugSession<'a, C> {
    client: &'a mut C,
    options: &'a DebugOptions,
    duration: Duration,
    console: &'a Console,
    clock: &'a dyn Clock,
    cancel: &'a CancellationToken,
}

impl<'a, C: DaemonClient> DebugSession<'a, C> {
    pub(crate) fn new(
        client: &'a mut C,
        options: &'a DebugOptions,
        duration: Duration,
        console: &'a Console,
        clock: &'a dyn Clock,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            client,
            options,
            duration,
            console,
            clock,
            cancel,
        }
    }

    /// Drives the session to completion.
    ///
    /// Restoration failures are written to the error stream as they happen
    /// and surface as [`SessionError::RestoreIncomplete`] only after the
    /// bundle has been reported. Progress and transition lines are best
    /// effort: a broken output stream never stops the daemon from being put
    /// back.
    pub(crate) async fn run(mut self) -> Result<(), SessionError> {
        let initial = or_cancel(SessionState::capture(self.client), self.cancel)
            .await
            .unwrap_or_else(|| Err(SessionError::Cancelled))?;
        debug!(?initial, "recorded daemon state");
        let mut changes = Changes::new(initial);

        let result = match self.collect(initial, &mut changes).await {
            Ok(result) => result,
            Err(error) => {
                self.report_leftovers(&changes);
                return Err(error);
            }
        };

        let restored = self.restore(initial, &mut changes).await;
        if restored.is_err() {
            self.report_leftovers(&changes);
        }
        report(&result, self.options, self.console)?;
        match restored? {
            0 => Ok(()),
            failures => Err(SessionError::RestoreIncomplete { failures }),
        }
    }

    async fn collect(
        &mut self,
        initial: SessionState,
        changes: &mut Changes,
    ) -> Result<BundleResult, SessionError> {
        if initial.was_disconnected() {
            step(self.cancel, self.client.up(), SessionError::Up).await?;
            changes.connected = true;
            self.announce("Netbird up");
            self.settle(CONNECT_GRACE).await?;
        }

        if initial.needs_elevation() {
            step(
                self.cancel,
                self.client.set_log_level(LogLevel::MAX_VERBOSITY),
                SessionError::Elevate,
            )
            .await?;
            changes.elevated = true;
            self.announce("Log level set to trace.");
        }

        step(self.cancel, self.client.down(), SessionError::Down).await?;
        changes.connected = false;
        self.announce("Netbird down");
        self.settle(DISCONNECT_SETTLE).await?;

        // Persistence must be switched on while disconnected; the daemon
        // does not recover a map it discarded before the flag was set.
        step(
            self.cancel,
            self.client.set_network_map_persistence(true),
            SessionError::EnablePersistence,
        )
        .await?;
        changes.persistence_enabled = true;

        step(self.cancel, self.client.up(), SessionError::Up).await?;
        changes.connected = true;
        self.announce("Netbird up");
        self.settle(RECONNECT_SETTLE).await?;

        let mut status = StatusReport::default();
        status.push(self.snapshot(SnapshotLabel::PostUp, None).await?);

        info!(duration = ?self.duration, "collecting trace logs");
        let progress = self.console.clone();
        let outcome = wait_for_duration_or_cancel(self.duration, self.cancel, move |remaining| {
            let line = format!("\rRemaining time: {}", format_remaining(remaining));
            if let Err(error) = progress.print(&line) {
                warn!(%error, "failed to write progress");
            }
        })
        .await;
        if outcome == WaitOutcome::Cancelled {
            return Err(SessionError::Cancelled);
        }
        self.announce("\nDuration completed");
        self.announce("Creating debug bundle...");

        status.push(
            self.snapshot(SnapshotLabel::PreDown, Some(self.duration))
                .await?,
        );
        let request = build_request(self.options, status.into_text());
        or_cancel(generate(self.client, request), self.cancel)
            .await
            .unwrap_or_else(|| Err(SessionError::Cancelled))
    }

    /// Undoes the connection and log-level changes, attempting both even if
    /// the first fails. Returns how many steps failed; only cancellation
    /// cuts restoration short.
    async fn restore(
        &mut self,
        initial: SessionState,
        changes: &mut Changes,
    ) -> Result<usize, SessionError> {
        let mut failures = 0usize;

        if initial.was_disconnected() {
            match step(self.cancel, self.client.down(), SessionError::Down).await {
                Ok(()) => {
                    changes.connected = false;
                    self.announce("Netbird down");
                }
                Err(SessionError::Cancelled) => return Err(SessionError::Cancelled),
                Err(error) => {
                    failures += 1;
                    self.report_failure(&error);
                }
            }
        }

        if changes.elevated {
            let level = initial.initial_log_level();
            match step(
                self.cancel,
                self.client.set_log_level(level),
                SessionError::RestoreLogLevel,
            )
            .await
            {
                Ok(()) => {
                    changes.elevated = false;
                    self.announce(format_args!("Log level restored to {level}"));
                }
                Err(SessionError::Cancelled) => return Err(SessionError::Cancelled),
                Err(error) => {
                    failures += 1;
                    self.report_failure(&error);
                }
            }
        }

        Ok(failures)
    }

    async fn settle(&self, duration: Duration) -> Result<(), SessionError> {
        match pause(duration, self.cancel).await {
            WaitOutcome::Completed => Ok(()),
            WaitOutcome::Cancelled => Err(SessionError::Cancelled),
        }
    }

    async fn snapshot(
        &mut self,
        label: SnapshotLabel,
        session_duration: Option<Duration>,
    ) -> Result<StatusSnapshot, SessionError> {
        let capturing = capture(
            self.client,
            label,
            session_duration,
            self.options.anonymize,
            self.clock,
            self.console,
        );
        match or_cancel(capturing, self.cancel).await {
            Some(snapshot) => Ok(snapshot?),
            None => Err(SessionError::Cancelled),
        }
    }

    /// Writes an operator line, logging rather than failing when the output
    /// stream is gone.
    fn announce(&self, line: impl Display) {
        if let Err(error) = self.console.println(line) {
            warn!(%error, "failed to write session output");
        }
    }

    fn report_failure(&self, error: &SessionError) {
        warn!(%error, "restoration step failed");
        if let Err(write_error) = self.console.eprintln(error) {
            warn!(%write_error, "failed to report restoration failure");
        }
    }

    fn report_leftovers(&self, changes: &Changes) {
        let leftovers = changes.leftovers();
        if leftovers.is_empty() {
            return;
        }
        let summary = leftovers.join("; ");
        warn!(state = %summary, "debug session ended early");
        if let Err(error) = self
            .console
            .eprintln(format_args!("Daemon state left changed: {summary}"))
        {
            warn!(%error, "failed to report daemon state");
        }
    }
}

/// Runs one daemon call, giving up as soon as the session is cancelled.
async fn step<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T, DaemonError>>,
    wrap: fn(DaemonError) -> SessionError,
) -> Result<T, SessionError> {
    match or_cancel(call, cancel).await {
        Some(result) => result.map_err(wrap),
        None => Err(SessionError::Cancelled),
    }
}
