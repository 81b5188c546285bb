//! Daily trigger for sync runs.

use std::sync::Arc;

use chrono::{DateTime, Days, Local, NaiveTime, TimeZone};
use outbox_sync::{RunReport, SyncOrchestrator};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Fires sync runs at fixed local wall-clock times.
///
/// Runs are awaited inline, so a run that outlasts the next scheduled time
/// simply delays it; two runs never overlap.
pub struct Scheduler {
    times: Vec<NaiveTime>,
    run_at_start: bool,
}

impl Scheduler {
    pub fn new(times: Vec<NaiveTime>, run_at_start: bool) -> Self {
        Self {
            times,
            run_at_start,
        }
    }

    /// Drives `orchestrator` until `shutdown` is cancelled. Returns the
    /// number of runs performed.
    pub async fn run(self, orchestrator: Arc<SyncOrchestrator>, shutdown: CancellationToken) -> u32 {
        let mut runs = 0;

        if self.run_at_start && !shutdown.is_cancelled() {
            log_report(&orchestrator.run().await);
            runs += 1;
        }

        let mut last_fired: Option<DateTime<Local>> = None;
        loop {
            let now = Local::now();
            // Never pick the same slot twice if the sleep woke a little early.
            let reference = match last_fired {
                Some(fired) if fired > now => fired,
                _ => now,
            };

            let Some(next) = next_fire(&reference, &self.times) else {
                warn!("no schedule times configured, waiting for shutdown");
                shutdown.cancelled().await;
                return runs;
            };

            let wait = (next - now).to_std().unwrap_or_default();
            info!(
                next = %next.format("%Y-%m-%d %H:%M"),
                wait_secs = wait.as_secs(),
                "next sync run scheduled"
            );

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!(runs, "scheduler stopping");
                    return runs;
                }
                _ = tokio::time::sleep(wait) => {}
            }

            last_fired = Some(next);
            log_report(&orchestrator.run().await);
            runs += 1;
        }
    }
}

/// Earliest of `times` strictly after `now`, today or on a following day.
///
/// Local times that do not exist on a given day (a DST gap) are skipped for
/// that day; ambiguous ones resolve to the earlier instant.
pub fn next_fire<Tz: TimeZone>(now: &DateTime<Tz>, times: &[NaiveTime]) -> Option<DateTime<Tz>> {
    let tz = now.timezone();
    let today = now.date_naive();
    let mut best: Option<DateTime<Tz>> = None;

    for offset in 0..=2 {
        let Some(day) = today.checked_add_days(Days::new(offset)) else {
            continue;
        };
        for time in times {
            let Some(candidate) = tz.from_local_datetime(&day.and_time(*time)).earliest() else {
                continue;
            };
            if candidate > *now && best.as_ref().is_none_or(|b| candidate < *b) {
                best = Some(candidate);
            }
        }
    }

    best
}

pub fn log_report(report: &RunReport) {
    if report.overlapped {
        return;
    }
    if let Some(err) = &report.scan_error {
        warn!(error = %err, "sync run could not read the outbox");
        return;
    }
    let secs = (report.finished_at - report.started_at).num_seconds();
    if report.is_clean() {
        info!(
            uploaded = report.uploaded(),
            skipped = report.skipped_entries(),
            duration_secs = secs,
            "sync run complete"
        );
    } else {
        warn!(
            uploaded = report.uploaded(),
            failed = report.failed(),
            skipped = report.skipped_entries(),
            duration_secs = secs,
            "sync run complete with failures"
        );
    }
}
