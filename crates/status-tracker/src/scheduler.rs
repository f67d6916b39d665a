use futures::future::BoxFuture;
use std::time::Duration;
use tokio::time::Instant;

/// A unit of deferred work.
pub type Task = BoxFuture<'static, ()>;

/// Runs a task once after a delay. Scheduled tasks cannot be cancelled.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, task: Task);
}

/// Spawns each task on the current Tokio runtime behind a timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        // Deadline is fixed now, not when the spawned task is first polled.
        let deadline = Instant::now() + delay;
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            task.await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn task_runs_only_after_the_delay() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        let (done_tx, done_rx) = tokio::sync::oneshot::channel();
        let start = Instant::now();
        TokioScheduler.schedule(
            Duration::from_secs(5),
            Box::pin(async move {
                flag.store(true, Ordering::SeqCst);
                let _ = done_tx.send(Instant::now());
            }),
        );

        tokio::time::advance(Duration::from_millis(4_999)).await;
        tokio::task::yield_now().await;
        assert!(!ran.load(Ordering::SeqCst));

        let fired_at = done_rx.await.unwrap();
        assert!(ran.load(Ordering::SeqCst));
        assert_eq!(fired_at - start, Duration::from_secs(5));
    }
}
