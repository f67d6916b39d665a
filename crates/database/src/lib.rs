//! # Database Crate
//!
//! A thin adapter over the official MongoDB driver. It knows how to turn the
//! configured connection string and tuning options into a verified connection,
//! and how to report when that connection later drops. It stores and queries
//! nothing.
//!
//! ## Public API
//!
//! - `MongoConnector`: opens verified connections to one configured deployment.
//! - `DbHandle`: a live connection (`ping`, `close`).
//! - `DisconnectHook`: callback fired when the deployment loses its last usable server.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod monitor;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{client_options, redact, write_concern, DbHandle, MongoConnector};
pub use error::DbError;
pub use monitor::DisconnectHook;
