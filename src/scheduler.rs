//! Build scheduler
//!
//! Periodically drains the leaf pool by calling `build` on a fixed interval.
//! Builds run on tokio's blocking pool since sled I/O is synchronous; the
//! service's build lock keeps them serialized with any on-demand builds.

use crate::service::MerkleTreeService;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

pub struct BuildScheduler {
    service: Arc<MerkleTreeService>,
    interval: Duration,
    batch_size: usize,
}

/// Handle to a running scheduler task.
pub struct SchedulerHandle {
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<SchedulerStats>,
}

/// Counters reported when the scheduler stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub builds: u64,
    pub failures: u64,
    pub leaves_applied: u64,
}

impl BuildScheduler {
    pub fn new(service: Arc<MerkleTreeService>, interval: Duration, batch_size: usize) -> Self {
        Self {
            service,
            interval,
            batch_size,
        }
    }

    /// Start ticking on the current tokio runtime.
    pub fn spawn(self) -> SchedulerHandle {
        let (shutdown, mut stop) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let mut stats = SchedulerStats::default();
            let mut ticker = interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                database = %self.service.database(),
                interval_ms = self.interval.as_millis() as u64,
                batch_size = self.batch_size,
                "Build scheduler started"
            );

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if self.service.pending_count() == 0 {
                            continue;
                        }
                        let service = Arc::clone(&self.service);
                        let batch_size = self.batch_size;
                        match tokio::task::spawn_blocking(move || service.try_build(batch_size)).await {
                            Ok(Ok(report)) => {
                                stats.builds += 1;
                                stats.leaves_applied += report.leaves_applied as u64;
                                debug!(leaves = report.leaves_applied, "Scheduled build finished");
                            }
                            Ok(Err(e)) => {
                                stats.failures += 1;
                                warn!(error = %e, retryable = e.is_retryable(), "Scheduled build failed");
                            }
                            Err(e) => {
                                stats.failures += 1;
                                warn!(error = %e, "Scheduled build task panicked");
                            }
                        }
                    }
                    _ = &mut stop => break,
                }
            }

            info!(builds = stats.builds, failures = stats.failures, "Build scheduler stopped");
            stats
        });
        SchedulerHandle { shutdown, task }
    }
}

impl SchedulerHandle {
    /// Stop after any in-flight build completes and return the counters.
    pub async fn shutdown(self) -> SchedulerStats {
        let _ = self.shutdown.send(());
        self.task.await.unwrap_or_default()
    }
}
