//! Cancellable countdown with once-per-second progress reports.

use std::future::Future;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::warn;

const TICK: Duration = Duration::from_secs(1);

/// How a wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitOutcome {
    Completed,
    Cancelled,
}

/// Waits until `duration` has elapsed or `cancel` fires.
///
/// A reporter task ticks every second from one second after the start and
/// hands `report` the remaining time; it stops once the duration is used up
/// or cancellation is observed and then signals completion. The reporter is
/// joined before returning, so `report` is never invoked after this
/// function resolves.
pub(crate) async fn wait_for_duration_or_cancel<F>(
    duration: Duration,
    cancel: &CancellationToken,
    mut report: F,
) -> WaitOutcome
where
    F: FnMut(Duration) + Send + 'static,
{
    let start = Instant::now();
    let (done_tx, done_rx) = oneshot::channel::<()>();
    let reporter_cancel = cancel.clone();

    let reporter = tokio::spawn(async move {
        let mut ticks = time::interval_at(start + TICK, TICK);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                biased;
                () = reporter_cancel.cancelled() => break,
                _ = ticks.tick() => {
                    let elapsed = start.elapsed();
                    if elapsed >= duration {
                        break;
                    }
                    report(duration.saturating_sub(elapsed));
                }
            }
        }
        // The receiver is gone when the parent already saw cancellation.
        done_tx.send(()).ok();
    });

    let outcome = tokio::select! {
        biased;
        () = cancel.cancelled() => WaitOutcome::Cancelled,
        _ = done_rx => WaitOutcome::Completed,
    };

    if let Err(error) = reporter.await {
        warn!(%error, "progress reporter ended abnormally");
    }
    outcome
}

/// Sleeps for `duration` unless `cancel` fires first.
pub(crate) async fn pause(duration: Duration, cancel: &CancellationToken) -> WaitOutcome {
    match or_cancel(time::sleep(duration), cancel).await {
        Some(()) => WaitOutcome::Completed,
        None => WaitOutcome::Cancelled,
    }
}

/// Drives `work` to completion unless `cancel` fires first, in which case
/// `work` is dropped and `None` is returned.
pub(crate) async fn or_cancel<F: Future>(
    work: F,
    cancel: &CancellationToken,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => None,
        output = work => Some(output),
    }
}

/// Formats a remaining duration as `HH:MM:SS`, rounding half a second up.
pub(crate) fn format_remaining(remaining: Duration) -> String {
    let mut seconds = remaining.as_secs();
    if remaining.subsec_millis() >= 500 {
        seconds += 1;
    }
    let (hours, rest) = (seconds / 3600, seconds % 3600);
    let (minutes, seconds) = (rest / 60, rest % 60);
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
