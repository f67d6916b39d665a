use crate::connector::Connector;
use crate::error::TrackerError;
use crate::retry::RetryPolicy;
use crate::scheduler::Scheduler;
use crate::status::StatusWriter;
use crate::tracker::{ConnectionTracker, Reconnect};
use async_trait::async_trait;
use configuration::DeploymentMode;
use std::sync::Arc;

/// Keeps a database connection available, in one of the two deployment postures.
#[async_trait]
pub trait EnsureConnected: Send + Sync {
    fn mode(&self) -> DeploymentMode;

    fn tracker(&self) -> &ConnectionTracker;

    /// Called once when the server starts. Must not wait on the database.
    fn start(&self);

    /// Called before every request. An error fails that request.
    async fn ensure_connected(&self) -> Result<(), TrackerError>;
}

/// Long-running process: connect at startup, reconnect on a timer.
pub struct BackgroundConnection {
    tracker: ConnectionTracker,
}

impl BackgroundConnection {
    pub fn new(tracker: ConnectionTracker) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl EnsureConnected for BackgroundConnection {
    fn mode(&self) -> DeploymentMode {
        DeploymentMode::Background
    }

    fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    fn start(&self) {
        let tracker = self.tracker.clone();
        tokio::spawn(async move {
            // Failures are recorded in the status and retried by the tracker.
            let _ = tracker.connect().await;
        });
    }

    async fn ensure_connected(&self) -> Result<(), TrackerError> {
        Ok(())
    }
}

/// Serverless posture: no connection at startup; each request connects if needed.
pub struct PerRequestConnection {
    tracker: ConnectionTracker,
}

impl PerRequestConnection {
    pub fn new(tracker: ConnectionTracker) -> Self {
        Self { tracker }
    }
}

#[async_trait]
impl EnsureConnected for PerRequestConnection {
    fn mode(&self) -> DeploymentMode {
        DeploymentMode::PerRequest
    }

    fn tracker(&self) -> &ConnectionTracker {
        &self.tracker
    }

    fn start(&self) {}

    async fn ensure_connected(&self) -> Result<(), TrackerError> {
        if self.tracker.is_ready() {
            return Ok(());
        }
        self.tracker.connect_if_needed().await
    }
}

/// Builds the strategy for `mode`, wiring a tracker to `connector` and `status`.
///
/// `policy` and `scheduler` are only used in background mode.
pub fn for_mode(
    mode: DeploymentMode,
    connector: Arc<dyn Connector>,
    status: StatusWriter,
    policy: RetryPolicy,
    scheduler: Arc<dyn Scheduler>,
) -> Arc<dyn EnsureConnected> {
    match mode {
        DeploymentMode::Background => {
            let reconnect = Reconnect::scheduled(policy, scheduler);
            let tracker = ConnectionTracker::new(connector, status, reconnect);
            Arc::new(BackgroundConnection::new(tracker))
        }
        DeploymentMode::PerRequest => {
            let tracker = ConnectionTracker::new(connector, status, Reconnect::OnDemand);
            Arc::new(PerRequestConnection::new(tracker))
        }
    }
}
