//! # Status Tracker Crate
//!
//! Tracks whether the process can reach its database and publishes a
//! human-readable status for the status page.
//!
//! ## Public API
//!
//! - `ConnectionTracker`: owns the session and is the sole writer of the status.
//! - `status_cell`, `StatusReader`, `StatusWriter`: the single-writer status cell.
//! - `RetryPolicy` and `Scheduler`: when and how reconnects are attempted.
//! - `EnsureConnected`: the deployment strategy (background or per-request),
//!   built with `for_mode`.
//! - `Connector` and `Session`: the seam to the database driver.

pub mod connector;
pub mod error;
pub mod retry;
pub mod scheduler;
pub mod status;
pub mod strategy;
pub mod tracker;

#[cfg(test)]
mod test_support;

pub use connector::{Connector, Session};
pub use error::TrackerError;
pub use retry::RetryPolicy;
pub use scheduler::{Scheduler, Task, TokioScheduler};
pub use status::{
    status_cell, ConnectionStatus, StatusReader, StatusSnapshot, StatusWriter, SUCCESS_MARKER,
};
pub use strategy::{for_mode, BackgroundConnection, EnsureConnected, PerRequestConnection};
pub use tracker::{ConnectionTracker, Reconnect};
