//! Periodic background jobs: a timer loop per job with error backoff, and
//! a single-flight guard for jobs that must not overlap themselves.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{Semaphore, TryAcquireError};
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Owns the background job tasks. Dropping the runner does not stop them;
/// call [`JobRunner::shutdown`] on daemon exit.
#[derive(Default)]
pub struct JobRunner {
    handles: Vec<JoinHandle<()>>,
}

impl JobRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `task` forever: sleep `interval` after success, `error_backoff`
    /// after a failure. Errors are logged, never fatal to the loop.
    pub fn spawn<F, Fut>(
        &mut self,
        name: &'static str,
        interval: Duration,
        error_backoff: Duration,
        task: F,
    ) where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send,
    {
        info!(
            job = name,
            interval_secs = interval.as_secs(),
            "Starting periodic job"
        );
        let handle = tokio::spawn(async move {
            loop {
                let next = match task().await {
                    Ok(()) => interval,
                    Err(e) => {
                        warn!(
                            job = name,
                            error = %e,
                            backoff_secs = error_backoff.as_secs(),
                            "Periodic job failed, backing off"
                        );
                        error_backoff
                    }
                };
                tokio::time::sleep(next).await;
            }
        });
        self.handles.push(handle);
    }

    /// Abort all job tasks.
    pub fn shutdown(self) {
        for handle in &self.handles {
            handle.abort();
        }
        info!(jobs = self.handles.len(), "Periodic jobs stopped");
    }
}

/// Skips a run when the previous one is still in flight, instead of
/// queueing behind it.
pub struct SingleFlight {
    semaphore: Arc<Semaphore>,
}

impl Default for SingleFlight {
    fn default() -> Self {
        Self::new()
    }
}

impl SingleFlight {
    pub fn new() -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(1)),
        }
    }

    /// Run the future if no other run holds the permit; `Ok(None)` when the
    /// run was skipped.
    pub async fn run<T, Fut>(&self, name: &str, fut: Fut) -> Result<Option<T>>
    where
        Fut: Future<Output = Result<T>>,
    {
        match self.semaphore.try_acquire() {
            Ok(_permit) => fut.await.map(Some),
            Err(TryAcquireError::NoPermits) => {
                info!(job = name, "Previous run still in flight, skipping");
                Ok(None)
            }
            Err(TryAcquireError::Closed) => {
                anyhow::bail!("single-flight semaphore closed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn job_runs_on_its_interval() {
        let count = Arc::new(AtomicU32::new(0));
        let mut runner = JobRunner::new();
        let c = count.clone();
        runner.spawn("tick", Duration::from_secs(60), Duration::from_secs(300), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        // Runs at t=0, 60, 120.
        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        runner.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn failing_job_uses_error_backoff() {
        let count = Arc::new(AtomicU32::new(0));
        let mut runner = JobRunner::new();
        let c = count.clone();
        runner.spawn(
            "broken",
            Duration::from_secs(3600),
            Duration::from_secs(300),
            move || {
                let c = c.clone();
                async move {
                    c.fetch_add(1, Ordering::SeqCst);
                    anyhow::bail!("downstream unavailable")
                }
            },
        );

        // Attempts at t=0, 300, 600, 900 rather than hourly.
        tokio::time::sleep(Duration::from_secs(950)).await;
        assert_eq!(count.load(Ordering::SeqCst), 4);
        runner.shutdown();
    }

    #[tokio::test]
    async fn overlapping_run_is_skipped_not_queued() {
        let guard = Arc::new(SingleFlight::new());
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        let g = guard.clone();
        let long_run = tokio::spawn(async move {
            g.run("sync", async move {
                release_rx.await.ok();
                Ok::<_, anyhow::Error>(1)
            })
            .await
        });

        // Let the long run take the permit.
        tokio::task::yield_now().await;

        let skipped = guard.run("sync", async { Ok::<_, anyhow::Error>(2) }).await.unwrap();
        assert!(skipped.is_none());

        release_tx.send(()).ok();
        let finished = long_run.await.unwrap().unwrap();
        assert_eq!(finished, Some(1));

        // Permit is free again.
        let next = guard.run("sync", async { Ok::<_, anyhow::Error>(3) }).await.unwrap();
        assert_eq!(next, Some(3));
    }
}
