//! # Scheduler
//!
//! Runs an async task on a fixed period until cancelled. The polling change
//! feed is built on it.
//!
//! The first run happens immediately. A run that overruns the period delays the
//! next one instead of bunching up. Cancelling interrupts a run in progress.

use std::future::Future;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

pub struct Scheduler;

impl Scheduler {
    /// Spawns `task` every `period`. Must be called from within a Tokio runtime.
    ///
    /// A zero period is raised to one millisecond.
    pub fn every<F, Fut>(name: &'static str, period: Duration, mut task: F) -> ScheduledTask
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let (cancel, mut cancelled) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            let mut runs: u64 = 0;
            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancelled => break,
                    _ = ticker.tick() => {}
                }
                tokio::select! {
                    biased;
                    _ = &mut cancelled => break,
                    _ = task() => runs += 1,
                }
            }
            debug!(name, runs, "Scheduled task stopped");
        });

        debug!(name, period_ms = period.as_millis() as u64, "Scheduled task started");
        ScheduledTask {
            name,
            cancel: Some(cancel),
            handle: Some(handle),
        }
    }
}

/// Handle to a running periodic task. Dropping it cancels the task.
pub struct ScheduledTask {
    name: &'static str,
    cancel: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Stops the task. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_none()
    }

    /// Cancels and waits for the task to finish.
    pub async fn stop(mut self) {
        self.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn counting(runs: &Arc<AtomicU32>) -> impl FnMut() -> std::future::Ready<()> + Send + 'static {
        let runs = runs.clone();
        move || {
            runs.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_runs_immediately_then_every_period() {
        let runs = Arc::new(AtomicU32::new(0));
        let task = Scheduler::every("test", Duration::from_secs(5), counting(&runs));

        tokio::time::sleep(Duration::from_millis(12_500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        task.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_further_runs() {
        let runs = Arc::new(AtomicU32::new(0));
        let mut task = Scheduler::every("test", Duration::from_secs(1), counting(&runs));

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        task.cancel();
        task.cancel();
        assert!(task.is_cancelled());
        let seen = runs.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(runs.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_cancels() {
        let runs = Arc::new(AtomicU32::new(0));
        drop(Scheduler::every("test", Duration::from_secs(1), counting(&runs)));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(runs.load(Ordering::SeqCst) <= 1);
    }
}
