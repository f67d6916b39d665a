use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackerError {
    /// The attempt failed. The message is the driver's text, unmodified.
    #[error("{0}")]
    Connection(String),

    #[error("The connection tracker has been shut down")]
    ShutDown,
}
