//! Periodic refresh task with a "refresh now" trigger and cancellation.
//!
//! The timer and the trigger both run the same cycle. Each cycle is its own task, so a
//! slow request never holds the timer back; overlapping cycles are allowed and whichever
//! commits last wins. Once the handle is shut down, results still in flight are dropped.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::http::ApiError;

/// Something that can reload itself from the backend.
pub trait Refresh: Send + Sync + 'static {
    type Output: Send + 'static;

    /// Human name used in log lines.
    fn name(&self) -> &'static str;

    /// Marks the start of a cycle (loading on, previous error cleared).
    fn begin(&self);

    fn load(&self) -> impl Future<Output = Result<Self::Output, ApiError>> + Send;

    /// Replaces the published state in one step.
    fn commit(&self, output: Self::Output);

    /// Records the failure and keeps the previous state.
    fn fail(&self, message: String);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Committed,
    Failed,
    Discarded,
}

/// Runs a single cycle in the caller's task.
pub async fn refresh_once<R: Refresh>(target: &R) -> CycleOutcome {
    run_cycle(target, || false).await
}

async fn run_cycle<R, C>(target: &R, cancelled: C) -> CycleOutcome
where
    R: Refresh,
    C: Fn() -> bool,
{
    if cancelled() {
        return CycleOutcome::Discarded;
    }
    target.begin();
    let result = target.load().await;
    if cancelled() {
        debug!(target = target.name(), "discarding refresh result after shutdown");
        return CycleOutcome::Discarded;
    }
    match result {
        Ok(output) => {
            target.commit(output);
            CycleOutcome::Committed
        }
        Err(err) => {
            warn!(target = target.name(), error = %err, "refresh failed; keeping previous data");
            target.fail(err.to_string());
            CycleOutcome::Failed
        }
    }
}

/// Clonable "refresh now" signal, e.g. for a foreground event.
#[derive(Debug, Clone)]
pub struct RefreshTrigger(mpsc::Sender<()>);

impl RefreshTrigger {
    /// Returns `false` once the loop has stopped. A pending trigger absorbs new ones.
    pub fn fire(&self) -> bool {
        match self.0.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => true,
            Err(mpsc::error::TrySendError::Closed(())) => false,
        }
    }
}

#[derive(Debug)]
pub struct RefreshHandle {
    cancel: watch::Sender<bool>,
    trigger: RefreshTrigger,
    task: JoinHandle<()>,
}

impl RefreshHandle {
    pub fn trigger(&self) -> RefreshTrigger {
        self.trigger.clone()
    }

    pub fn refresh_now(&self) -> bool {
        self.trigger.fire()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops the timer and discards anything still in flight.
    pub async fn shutdown(mut self) {
        self.cancel.send_replace(true);
        if let Err(err) = (&mut self.task).await {
            warn!(error = %err, "refresh loop ended abnormally");
        }
    }
}

/// Dropping the handle cancels the loop the same way `shutdown` does, without waiting.
impl Drop for RefreshHandle {
    fn drop(&mut self) {
        self.cancel.send_replace(true);
    }
}

/// Refreshes immediately, then every `period`, and whenever the trigger fires.
pub fn spawn_refresh_loop<R: Refresh>(target: Arc<R>, period: Duration) -> RefreshHandle {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let (trigger_tx, mut trigger_rx) = mpsc::channel(1);

    let task = tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut shutdown = cancel_rx.clone();

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => spawn_cycle(&target, &cancel_rx),
                Some(()) = trigger_rx.recv() => spawn_cycle(&target, &cancel_rx),
            }
        }
        debug!(target = target.name(), "refresh loop stopped");
    });

    RefreshHandle {
        cancel: cancel_tx,
        trigger: RefreshTrigger(trigger_tx),
        task,
    }
}

fn spawn_cycle<R: Refresh>(target: &Arc<R>, cancel: &watch::Receiver<bool>) {
    let target = Arc::clone(target);
    let cancel = cancel.clone();
    tokio::spawn(async move {
        run_cycle(target.as_ref(), move || *cancel.borrow()).await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Counter {
        loads: AtomicUsize,
        committed: Mutex<Vec<usize>>,
        failures: Mutex<Vec<String>>,
        fail_on: Option<usize>,
        delay: Option<Duration>,
    }

    impl Refresh for Counter {
        type Output = usize;

        fn name(&self) -> &'static str {
            "counter"
        }

        fn begin(&self) {}

        async fn load(&self) -> Result<usize, ApiError> {
            let n = self.loads.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_on == Some(n) {
                return Err(ApiError::from_status(500, String::new()));
            }
            Ok(n)
        }

        fn commit(&self, output: usize) {
            self.committed.lock().expect("committed poisoned").push(output);
        }

        fn fail(&self, message: String) {
            self.failures.lock().expect("failures poisoned").push(message);
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn refreshes_on_start_and_every_period() {
        let counter = Arc::new(Counter::default());
        let handle = spawn_refresh_loop(Arc::clone(&counter), Duration::from_secs(30));

        settle().await;
        assert_eq!(counter.loads.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(counter.loads.load(Ordering::SeqCst), 2);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn trigger_runs_an_extra_cycle() {
        let counter = Arc::new(Counter::default());
        let handle = spawn_refresh_loop(Arc::clone(&counter), Duration::from_secs(30));
        settle().await;

        assert!(handle.refresh_now());
        settle().await;
        assert_eq!(counter.loads.load(Ordering::SeqCst), 2);

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_stop_the_loop() {
        let counter = Arc::new(Counter {
            fail_on: Some(1),
            ..Counter::default()
        });
        let handle = spawn_refresh_loop(Arc::clone(&counter), Duration::from_secs(30));
        settle().await;
        assert_eq!(counter.failures.lock().expect("lock").as_slice(), ["HTTP 500"]);

        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(counter.committed.lock().expect("lock").as_slice(), [2]);
        assert!(handle.is_running());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn in_flight_results_are_dropped_after_shutdown() {
        let counter = Arc::new(Counter {
            delay: Some(Duration::from_secs(5)),
            ..Counter::default()
        });
        let handle = spawn_refresh_loop(Arc::clone(&counter), Duration::from_secs(30));
        settle().await;
        assert_eq!(counter.loads.load(Ordering::SeqCst), 1);

        handle.shutdown().await;
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;

        assert!(counter.committed.lock().expect("lock").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_discards_in_flight_results() {
        let counter = Arc::new(Counter {
            delay: Some(Duration::from_secs(5)),
            ..Counter::default()
        });
        let handle = spawn_refresh_loop(Arc::clone(&counter), Duration::from_secs(30));
        settle().await;
        assert_eq!(counter.loads.load(Ordering::SeqCst), 1);

        drop(handle);
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;

        assert!(counter.committed.lock().expect("lock").is_empty());
        tokio::time::advance(Duration::from_secs(30)).await;
        settle().await;
        assert_eq!(counter.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refresh_once_commits_in_place() {
        let counter = Counter::default();
        assert_eq!(refresh_once(&counter).await, CycleOutcome::Committed);
        assert_eq!(counter.committed.lock().expect("lock").as_slice(), [1]);
    }
}
