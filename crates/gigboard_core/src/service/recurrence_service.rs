//! Recurring-task reset engine.
//!
//! # Responsibility
//! - Sweep every project and reset recurring tasks whose window elapsed.
//! - Run the sweep periodically on a background thread.
//!
//! # Invariants
//! - Missed windows collapse into one reset; `last_reset_at` lands on the
//!   latest window boundary not after `now`.
//! - Cancelled tasks keep their status; only their window advances.
//! - Projects without changes are not rewritten.
//! - Sweeps race with user writes; the last write wins.

use crate::model::task::{Frequency, Recurrence, TaskStatus};
use crate::repo::project_repo::{ProjectRepository, RepoResult};
use crate::service::project_service::system_clock;
use log::{error, info};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Outcome of one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub projects_scanned: usize,
    pub tasks_reset: usize,
    pub projects_written: usize,
}

/// Applies recurrence resets over a project repository.
pub struct RecurrenceEngine<R: ProjectRepository> {
    repo: R,
}

impl<R: ProjectRepository> RecurrenceEngine<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Resets every recurring task whose window elapsed by `now_ms`.
    pub fn sweep(&self, now_ms: i64) -> RepoResult<SweepReport> {
        let started_at = Instant::now();
        let mut report = SweepReport::default();

        for mut project in self.repo.list_projects()? {
            report.projects_scanned += 1;
            let mut changed = false;

            for task in project.tasks_mut() {
                let Some(recurrence) = task.recurrence else {
                    continue;
                };
                let Some(boundary) = elapsed_boundary(&recurrence, now_ms) else {
                    continue;
                };
                task.recurrence = Some(Recurrence {
                    last_reset_at: boundary,
                    ..recurrence
                });
                changed = true;
                if task.status != TaskStatus::Cancelled {
                    task.set_status(recurrence.initial_status, now_ms);
                    report.tasks_reset += 1;
                }
            }

            if changed {
                project.updated_at = now_ms.max(project.updated_at);
                self.repo.save_project(&project)?;
                report.projects_written += 1;
            }
        }

        info!(
            "event=recurrence_sweep module=recurrence status=ok projects_scanned={} tasks_reset={} projects_written={} duration_ms={}",
            report.projects_scanned,
            report.tasks_reset,
            report.projects_written,
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }
}

/// Returns the latest window boundary `<= now_ms`, or `None` while the
/// current window is still open.
pub fn elapsed_boundary(recurrence: &Recurrence, now_ms: i64) -> Option<i64> {
    let first = recurrence.next_reset_at()?;
    if first > now_ms {
        return None;
    }

    let span = match recurrence.frequency {
        Frequency::Daily => Some(DAY_MS),
        Frequency::Weekly => Some(7 * DAY_MS),
        Frequency::Monthly => None,
    };
    if let Some(span) = span {
        let skipped = (now_ms - first) / span;
        return Some(first + skipped * span);
    }

    let mut boundary = first;
    while let Some(next) = recurrence.frequency.advance(boundary) {
        if next > now_ms {
            break;
        }
        boundary = next;
    }
    Some(boundary)
}

/// Handle to a running sweep thread. Dropping it stops the thread.
pub struct SchedulerHandle {
    stop_tx: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Signals the sweep thread and waits for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                error!("event=recurrence_scheduler module=recurrence status=error error_code=thread_panicked");
            }
        }
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Periodic driver for `RecurrenceEngine::sweep`.
pub struct RecurrenceScheduler;

impl RecurrenceScheduler {
    /// Spawns a thread that sweeps immediately and then every `interval`.
    ///
    /// Sweep failures are logged; the loop keeps running.
    pub fn start<R>(
        engine: Arc<RecurrenceEngine<R>>,
        interval: Duration,
    ) -> std::io::Result<SchedulerHandle>
    where
        R: ProjectRepository + Send + Sync + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let join = thread::Builder::new()
            .name("gigboard-recurrence".to_string())
            .spawn(move || {
                info!(
                    "event=recurrence_scheduler module=recurrence status=start interval_ms={}",
                    interval.as_millis()
                );
                loop {
                    if let Err(err) = engine.sweep(system_clock()) {
                        error!(
                            "event=recurrence_sweep module=recurrence status=error error={err}"
                        );
                    }
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                info!("event=recurrence_scheduler module=recurrence status=stop");
            })?;

        Ok(SchedulerHandle {
            stop_tx: Some(stop_tx),
            join: Some(join),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{elapsed_boundary, DAY_MS};
    use crate::model::task::{Frequency, Recurrence};
    use chrono::{TimeZone, Utc};

    fn ms(y: i32, m: u32, d: u32) -> i64 {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0)
            .single()
            .expect("valid date")
            .timestamp_millis()
    }

    #[test]
    fn open_window_has_no_boundary() {
        let recurrence = Recurrence::new(Frequency::Daily, 0);
        assert_eq!(elapsed_boundary(&recurrence, DAY_MS - 1), None);
        assert_eq!(elapsed_boundary(&recurrence, DAY_MS), Some(DAY_MS));
    }

    #[test]
    fn missed_daily_windows_collapse_to_latest() {
        let recurrence = Recurrence::new(Frequency::Daily, 0);
        assert_eq!(
            elapsed_boundary(&recurrence, 5 * DAY_MS + 17),
            Some(5 * DAY_MS)
        );
    }

    #[test]
    fn weekly_boundary_is_aligned_to_start() {
        let recurrence = Recurrence::new(Frequency::Weekly, 3);
        assert_eq!(
            elapsed_boundary(&recurrence, 3 + 15 * DAY_MS),
            Some(3 + 14 * DAY_MS)
        );
    }

    #[test]
    fn monthly_boundary_walks_calendar_months() {
        let recurrence = Recurrence::new(Frequency::Monthly, ms(2024, 1, 10));
        assert_eq!(
            elapsed_boundary(&recurrence, ms(2024, 4, 9)),
            Some(ms(2024, 3, 10))
        );
        assert_eq!(elapsed_boundary(&recurrence, ms(2024, 2, 9)), None);
    }
}
