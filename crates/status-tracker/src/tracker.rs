use crate::connector::{Connector, Session};
use crate::error::TrackerError;
use crate::retry::RetryPolicy;
use crate::scheduler::Scheduler;
use crate::status::{ConnectionStatus, StatusReader, StatusSnapshot, StatusWriter};
use database::DisconnectHook;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{mpsc, Mutex};

/// What the tracker does after a failed attempt or a dropped connection.
#[derive(Clone)]
pub enum Reconnect {
    /// Retry on a timer, driven by `scheduler` according to `policy`.
    Scheduled {
        policy: RetryPolicy,
        scheduler: Arc<dyn Scheduler>,
    },
    /// Never retry on its own; callers reconnect when they need a connection.
    OnDemand,
}

impl Reconnect {
    pub fn scheduled(policy: RetryPolicy, scheduler: Arc<dyn Scheduler>) -> Self {
        Reconnect::Scheduled { policy, scheduler }
    }
}

/// A disconnect reported by the driver, tagged with the attempt that opened the session.
#[derive(Debug)]
struct Disconnect {
    epoch: u64,
    reason: String,
}

/// Owns the database session and is the only writer of the connection status.
///
/// Cloning yields another handle to the same tracker.
#[derive(Clone)]
pub struct ConnectionTracker {
    inner: Arc<Inner>,
}

struct Inner {
    connector: Arc<dyn Connector>,
    reconnect: Reconnect,
    status: StatusWriter,
    /// Held for the whole of an attempt, so at most one is ever in flight.
    session: Mutex<Option<Arc<dyn Session>>>,
    /// Incremented per attempt; disconnects from older attempts are stale.
    epoch: AtomicU64,
    consecutive_failures: AtomicU32,
    retry_pending: AtomicBool,
    closed: AtomicBool,
    events: mpsc::UnboundedSender<Disconnect>,
}

impl ConnectionTracker {
    /// Creates a tracker and spawns the task that consumes driver disconnect events.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(connector: Arc<dyn Connector>, status: StatusWriter, reconnect: Reconnect) -> Self {
        let (events, rx) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            connector,
            reconnect,
            status,
            session: Mutex::new(None),
            epoch: AtomicU64::new(0),
            consecutive_failures: AtomicU32::new(0),
            retry_pending: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            events,
        });
        tokio::spawn(listen_for_disconnects(Arc::downgrade(&inner), rx));
        Self { inner }
    }

    /// Attempts a connection and records the outcome.
    ///
    /// A previously held session is replaced. On failure the status carries the
    /// driver's message and, when reconnecting on a timer, one retry is scheduled.
    pub async fn connect(&self) -> Result<(), TrackerError> {
        let mut session = self.inner.session.lock().await;
        self.inner.attempt(&mut session).await
    }

    /// Connects only if there is no live session.
    ///
    /// Callers that queue behind an in-flight attempt see its result instead of
    /// starting another one.
    pub async fn connect_if_needed(&self) -> Result<(), TrackerError> {
        let mut session = self.inner.session.lock().await;
        if session.is_some() && self.is_ready() {
            return Ok(());
        }
        self.inner.attempt(&mut session).await
    }

    /// Records that the current session dropped.
    ///
    /// The driver hook installed by [`connect`](Self::connect) routes here
    /// automatically; this entry point is for callers that detect the loss themselves.
    pub async fn on_disconnected(&self, reason: impl Into<String>) {
        let epoch = self.inner.epoch.load(Ordering::SeqCst);
        self.inner
            .handle_disconnect(Disconnect {
                epoch,
                reason: reason.into(),
            })
            .await;
    }

    /// The latest status. Never waits on I/O.
    pub fn get_status(&self) -> StatusSnapshot {
        self.inner.status.current()
    }

    pub fn status_reader(&self) -> StatusReader {
        self.inner.status.reader()
    }

    /// True while a verified session is held.
    pub fn is_ready(&self) -> bool {
        !self.inner.closed.load(Ordering::SeqCst) && self.get_status().status.is_success()
    }

    /// Closes the held session. Retries that fire afterwards do nothing.
    pub async fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        let mut session = self.inner.session.lock().await;
        if let Some(open) = session.take() {
            open.close().await;
            tracing::info!("Database connection closed.");
        }
    }
}

impl Inner {
    async fn attempt(
        self: &Arc<Self>,
        slot: &mut Option<Arc<dyn Session>>,
    ) -> Result<(), TrackerError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TrackerError::ShutDown);
        }

        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let attempt = self.status.begin_attempt();
        tracing::debug!(attempt, "Connecting to MongoDB.");

        // The driver may report topology churn while the handshake is still
        // running; only losses after the session is handed back count.
        let live = Arc::new(AtomicBool::new(false));
        match self.connector.connect(self.disconnect_hook(epoch, live.clone())).await {
            Ok(session) => {
                live.store(true, Ordering::SeqCst);
                if let Some(previous) = slot.replace(session) {
                    previous.close().await;
                }
                self.consecutive_failures.store(0, Ordering::SeqCst);
                self.status.set(ConnectionStatus::Connected);
                tracing::info!(attempt, "MongoDB connection established.");
                Ok(())
            }
            Err(err) => {
                if let Some(previous) = slot.take() {
                    previous.close().await;
                }
                let failures = self.consecutive_failures.fetch_add(1, Ordering::SeqCst) + 1;
                self.status.set(ConnectionStatus::Failed(err.to_string()));
                tracing::error!(attempt, failures, error = %err, "MongoDB connection failed.");
                self.schedule_retry(failures);
                Err(err)
            }
        }
    }

    async fn handle_disconnect(self: &Arc<Self>, event: Disconnect) {
        let mut slot = self.session.lock().await;
        let current = self.epoch.load(Ordering::SeqCst);
        if self.closed.load(Ordering::SeqCst) || event.epoch != current || slot.is_none() {
            tracing::debug!(
                epoch = event.epoch,
                current,
                "Ignoring disconnect for an inactive session."
            );
            return;
        }

        let lost = slot.take();
        self.status.set(ConnectionStatus::Disconnected(event.reason.clone()));
        tracing::warn!(reason = %event.reason, "MongoDB disconnected.");
        if let Some(lost) = lost {
            lost.close().await;
        }
        drop(slot);

        self.schedule_retry(self.consecutive_failures.load(Ordering::SeqCst));
    }

    /// Schedules one retry unless one is already pending or the policy is spent.
    fn schedule_retry(self: &Arc<Self>, consecutive_failures: u32) {
        let Reconnect::Scheduled { policy, scheduler } = &self.reconnect else {
            return;
        };
        if self.closed.load(Ordering::SeqCst) {
            return;
        }
        let Some(delay) = policy.next_delay(consecutive_failures) else {
            tracing::warn!(consecutive_failures, "Retry budget exhausted; not reconnecting.");
            return;
        };
        if self.retry_pending.swap(true, Ordering::SeqCst) {
            return;
        }

        tracing::warn!(delay_secs = delay.as_secs_f64(), "Reconnect scheduled.");
        let tracker = Arc::downgrade(self);
        scheduler.schedule(
            delay,
            Box::pin(async move {
                let Some(inner) = tracker.upgrade() else {
                    return;
                };
                inner.retry_pending.store(false, Ordering::SeqCst);
                let mut slot = inner.session.lock().await;
                // The outcome is already in the status, and a failure reschedules itself.
                let _ = inner.attempt(&mut slot).await;
            }),
        );
    }

    fn disconnect_hook(&self, epoch: u64, live: Arc<AtomicBool>) -> DisconnectHook {
        let events = self.events.clone();
        Arc::new(move |reason: String| {
            if live.load(Ordering::SeqCst) {
                let _ = events.send(Disconnect { epoch, reason });
            }
        })
    }
}

async fn listen_for_disconnects(
    inner: Weak<Inner>,
    mut rx: mpsc::UnboundedReceiver<Disconnect>,
) {
    while let Some(event) = rx.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.handle_disconnect(event).await;
    }
}
