//! Daily report scheduler.
//!
//! A long-lived task that sleeps until the next 18:00 site-local, drains
//! the registry, and hands the snapshot to the report sender. Send
//! failures are logged and the loop moves on to the next day; drained
//! counts are not restored (accepted data loss - there is no rollback).
//!
//! Uses cooperative shutdown via `CancellationToken`; no drain is owed on
//! shutdown since the counters carry no persistence guarantee.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Days, FixedOffset, NaiveTime};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use visitd_core::{clock, SITE_TZ};

use crate::registry::VisitRegistry;
use crate::report::ReportSender;

/// Wall-clock hour (site-local) at which the daily report fires.
pub const REPORT_HOUR: u32 = 18;

/// Wall-clock minute at which the daily report fires.
pub const REPORT_MINUTE: u32 = 0;

/// Computes when the report should next fire.
///
/// Today at 18:00 if `now` has not passed it yet, otherwise 18:00 on the
/// next calendar day. The advance is calendar-aware: Jan 31 rolls over to
/// Feb 1 and Dec 31 to Jan 1 of the next year.
pub fn next_fire_time(now: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let report_time =
        NaiveTime::from_hms_opt(REPORT_HOUR, REPORT_MINUTE, 0).unwrap_or(NaiveTime::MIN);

    let mut target = now.date_naive().and_time(report_time);
    if now.naive_local() > target {
        // checked_add_days only fails at NaiveDate::MAX
        target = target.checked_add_days(Days::new(1)).unwrap_or(target);
    }

    // A fixed offset maps every local datetime to exactly one instant.
    target.and_local_timezone(SITE_TZ).single().unwrap_or(now)
}

/// Spawns the scheduler task.
///
/// Runs until the cancellation token fires. Each cycle sleeps until the
/// next 18:00 site-local, drains the registry, and sends the report
/// outside the registry lock.
pub fn spawn_scheduler_task(
    registry: Arc<VisitRegistry>,
    reports: Arc<ReportSender>,
    cancel_token: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            report_hour = REPORT_HOUR,
            report_minute = REPORT_MINUTE,
            "Report scheduler started"
        );

        loop {
            let now = clock::local_now();
            let target = next_fire_time(now);
            let wait = (target - now).to_std().unwrap_or(Duration::ZERO);

            debug!(
                target = %target,
                wait_secs = wait.as_secs(),
                "Sleeping until next scheduled report"
            );

            tokio::select! {
                biased;

                _ = cancel_token.cancelled() => {
                    info!("Report scheduler shutting down");
                    break;
                }

                _ = sleep(wait) => {
                    let snapshot = registry.drain_and_reset();
                    if let Err(e) = reports.send(&snapshot).await {
                        // Drained counts are lost on failure; the next
                        // cycle starts from zero regardless.
                        error!(
                            error = %e,
                            total = snapshot.total(),
                            "Failed to send daily report"
                        );
                    }
                }
            }
        }
    })
}
