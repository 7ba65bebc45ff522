//! Background worker driving the lifecycle checks.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::lifecycle::{CheckOutcome, CheckTrigger, LifecycleController};
use crate::refresh::RefreshService;

/// Default period between expiry checks.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Runs an on-mount check immediately, then a check every `interval`.
pub struct LifecycleWorker<R> {
    controller: Arc<LifecycleController<R>>,
    interval: Duration,
}

/// Handle to a running worker. Dropping it cancels the timer.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: Arc<Notify>,
    task: Option<JoinHandle<Option<String>>>,
}

impl<R: RefreshService> LifecycleWorker<R> {
    pub fn new(controller: Arc<LifecycleController<R>>) -> Self {
        Self {
            controller,
            interval: DEFAULT_CHECK_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Start the worker.
    ///
    /// The spawned task:
    /// - Checks once right away (a credential may have expired while closed)
    /// - Checks again every `interval`, skipping missed ticks
    /// - Ends when the session becomes invalid, yielding the login target
    /// - Ends on [`WorkerHandle::stop`] or when the handle is dropped
    pub fn start(self) -> WorkerHandle {
        let shutdown = Arc::new(Notify::new());
        let signal = shutdown.clone();
        let controller = self.controller;
        let period = self.interval;

        let task = tokio::spawn(async move {
            tracing::info!(?period, "session lifecycle worker started");

            if let CheckOutcome::LoginRequired { redirect_to } =
                controller.check(CheckTrigger::Mount).await
            {
                tracing::info!(%redirect_to, "session invalid on mount");
                return Some(redirect_to);
            }

            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = signal.notified() => {
                        tracing::info!("session lifecycle worker received shutdown signal");
                        return None;
                    }
                    _ = ticker.tick() => {
                        if let CheckOutcome::LoginRequired { redirect_to } =
                            controller.check(CheckTrigger::Interval).await
                        {
                            tracing::info!(%redirect_to, "session invalid; stopping worker");
                            return Some(redirect_to);
                        }
                    }
                }
            }
        });

        WorkerHandle {
            shutdown,
            task: Some(task),
        }
    }
}

impl WorkerHandle {
    /// Whether the worker task has ended on its own or been stopped.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop the timer and wait for the task.
    ///
    /// Returns the login target if the worker ended because the session
    /// became invalid.
    pub async fn stop(mut self) -> Option<String> {
        self.shutdown.notify_one();
        let task = self.task.take()?;
        match task.await {
            Ok(target) => target,
            Err(e) => {
                tracing::warn!(error = %e, "session lifecycle worker ended abnormally");
                None
            }
        }
    }

    /// Wait for the worker to end on its own (the session became invalid).
    pub async fn finished(mut self) -> Option<String> {
        let task = self.task.take()?;
        task.await.ok().flatten()
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
