use chrono::{DateTime, Utc};
use std::fmt;
use tokio::sync::watch;

/// Present in the status text exactly when the last attempt succeeded.
pub const SUCCESS_MARKER: &str = "✅";

/// The last known outcome of connecting to the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No attempt has finished yet.
    Checking,
    Connected,
    /// The most recent attempt failed with this driver message.
    Failed(String),
    /// An established connection dropped for this reason.
    Disconnected(String),
}

impl ConnectionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ConnectionStatus::Connected)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Checking => write!(f, "Checking connection..."),
            ConnectionStatus::Connected => {
                write!(f, "{SUCCESS_MARKER} MongoDB Connection Successful!")
            }
            ConnectionStatus::Failed(message) => {
                write!(f, "❌ MongoDB Connection Failed: {message}")
            }
            ConnectionStatus::Disconnected(reason) => {
                write!(f, "⚠️ MongoDB Disconnected: {reason}")
            }
        }
    }
}

/// What readers see: the status plus when it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    pub status: ConnectionStatus,
    pub updated_at: DateTime<Utc>,
    /// Connection attempts started since the process came up.
    pub attempts: u64,
}

impl StatusSnapshot {
    fn initial() -> Self {
        Self {
            status: ConnectionStatus::Checking,
            updated_at: Utc::now(),
            attempts: 0,
        }
    }
}

/// Creates the status cell. The writer goes to the tracker, readers to the renderer.
pub fn status_cell() -> (StatusWriter, StatusReader) {
    let (tx, rx) = watch::channel(StatusSnapshot::initial());
    (StatusWriter { tx }, StatusReader { rx })
}

/// The single write side of the status cell. Not `Clone`.
#[derive(Debug)]
pub struct StatusWriter {
    tx: watch::Sender<StatusSnapshot>,
}

impl StatusWriter {
    pub fn set(&self, status: ConnectionStatus) {
        self.tx.send_modify(|snapshot| {
            snapshot.status = status;
            snapshot.updated_at = Utc::now();
        });
    }

    /// Counts a new attempt without touching the visible status.
    pub fn begin_attempt(&self) -> u64 {
        let mut attempts = 0;
        self.tx.send_if_modified(|snapshot| {
            snapshot.attempts += 1;
            attempts = snapshot.attempts;
            false
        });
        attempts
    }

    pub fn current(&self) -> StatusSnapshot {
        self.tx.borrow().clone()
    }

    pub fn reader(&self) -> StatusReader {
        StatusReader {
            rx: self.tx.subscribe(),
        }
    }
}

/// A read handle on the status cell. Reads never wait on I/O.
#[derive(Debug, Clone)]
pub struct StatusReader {
    rx: watch::Receiver<StatusSnapshot>,
}

impl StatusReader {
    pub fn get(&self) -> StatusSnapshot {
        self.rx.borrow().clone()
    }

    /// Resolves with the first snapshot, current or future, that satisfies `predicate`.
    ///
    /// If the writer is dropped first, the final snapshot is returned as is.
    pub async fn wait_for<F>(&mut self, mut predicate: F) -> StatusSnapshot
    where
        F: FnMut(&StatusSnapshot) -> bool,
    {
        loop {
            {
                let snapshot = self.rx.borrow_and_update();
                if predicate(&snapshot) {
                    return snapshot.clone();
                }
            }
            if self.rx.changed().await.is_err() {
                return self.rx.borrow().clone();
            }
        }
    }
}
