//! Scripted stand-ins for the database and the timer.

use crate::connector::{Connector, Session};
use crate::error::TrackerError;
use crate::scheduler::{Scheduler, Task};
use async_trait::async_trait;
use database::DisconnectHook;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct ScriptedConnector {
    reachable: AtomicBool,
    failure: String,
    attempts: AtomicUsize,
    closed: Arc<AtomicUsize>,
    hooks: Mutex<Vec<DisconnectHook>>,
    /// Reported through the hook while `connect` is still running.
    handshake_noise: Option<String>,
}

struct ScriptedSession {
    closed: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    pub fn reachable() -> Arc<Self> {
        Self::build(true, "unreachable", None)
    }

    /// Reachable, but fires its disconnect hook before each connect returns.
    pub fn noisy(reason: &str) -> Arc<Self> {
        Self::build(true, "unreachable", Some(reason.to_string()))
    }

    pub fn unreachable(failure: &str) -> Arc<Self> {
        Self::build(false, failure, None)
    }

    fn build(reachable: bool, failure: &str, handshake_noise: Option<String>) -> Arc<Self> {
        Arc::new(Self {
            reachable: AtomicBool::new(reachable),
            failure: failure.to_string(),
            attempts: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
            hooks: Mutex::new(Vec::new()),
            handshake_noise,
        })
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Sessions closed so far.
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// The disconnect hook handed over on the `index`-th attempt.
    pub fn hook(&self, index: usize) -> DisconnectHook {
        self.hooks.lock().unwrap()[index].clone()
    }

    /// Fires the hook of the most recent attempt, as the driver would.
    pub fn fire_disconnect(&self, reason: &str) {
        let hook = self.hooks.lock().unwrap().last().cloned();
        let hook = hook.expect("no attempt made yet");
        hook(reason.to_string());
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(
        &self,
        on_disconnect: DisconnectHook,
    ) -> Result<Arc<dyn Session>, TrackerError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = &self.handshake_noise {
            on_disconnect(reason.clone());
        }
        self.hooks.lock().unwrap().push(on_disconnect);
        if self.reachable.load(Ordering::SeqCst) {
            Ok(Arc::new(ScriptedSession {
                closed: self.closed.clone(),
            }))
        } else {
            Err(TrackerError::Connection(self.failure.clone()))
        }
    }
}

#[async_trait]
impl Session for ScriptedSession {
    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Queues tasks instead of running them; tests fire them explicitly.
#[derive(Default)]
pub struct RecordingScheduler {
    queue: Mutex<VecDeque<(Duration, Task)>>,
    delays: Mutex<Vec<Duration>>,
}

impl RecordingScheduler {
    /// Every delay ever requested, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }

    pub fn pending(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    /// Runs the oldest queued task to completion.
    pub async fn run_next(&self) {
        let next = self.queue.lock().unwrap().pop_front();
        if let Some((_, task)) = next {
            task.await;
        }
    }
}

impl Scheduler for RecordingScheduler {
    fn schedule(&self, delay: Duration, task: Task) {
        self.delays.lock().unwrap().push(delay);
        self.queue.lock().unwrap().push_back((delay, task));
    }
}
