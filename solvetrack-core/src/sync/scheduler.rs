//! Recurring "sync all".
//!
//! Nothing is scheduled implicitly: the owning process calls
//! [`SyncScheduler::start`] once and keeps the returned handle until
//! shutdown. The first run happens immediately.

use std::time::Duration;

use chrono::Local;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{SyncCoordinator, SyncResult};

/// Starts the recurring sync task.
pub struct SyncScheduler;

impl SyncScheduler {
    /// Run `sync_all` every `interval` until stopped.
    pub fn start(coordinator: SyncCoordinator, interval: Duration) -> SchedulerHandle {
        Self::start_with_callback(coordinator, interval, |_| {})
    }

    /// Like [`SyncScheduler::start`], calling `on_run` after each completed sync.
    pub fn start_with_callback<F>(
        coordinator: SyncCoordinator,
        interval: Duration,
        mut on_run: F,
    ) -> SchedulerHandle
    where
        F: FnMut(&SyncResult) + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut runs = 0u64;

            tracing::info!(interval_secs = interval.as_secs(), "Sync scheduler started");

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let today = Local::now().date_naive();
                        match coordinator.sync_all(today).await {
                            Ok(result) => on_run(&result),
                            Err(e) => tracing::error!(error = %e, "Scheduled sync failed"),
                        }
                        runs += 1;
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::info!(runs, "Sync scheduler stopped");
            runs
        });

        SchedulerHandle { stop_tx, task }
    }
}

/// Owner of a running scheduler.
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<u64>,
}

impl SchedulerHandle {
    /// Stop after any in-flight sync finishes. Returns the number of runs.
    pub async fn stop(self) -> u64 {
        let _ = self.stop_tx.send(true);
        match self.task.await {
            Ok(runs) => runs,
            Err(e) => {
                tracing::warn!(error = %e, "Sync scheduler task failed");
                0
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
