use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid database connection options: {0}")]
    ConnectionConfigError(String),

    #[error("Failed to connect to the database: {0}")]
    ConnectionError(#[from] mongodb::error::Error),
}

impl DbError {
    /// The underlying message without this crate's prefix.
    ///
    /// The status page shows driver errors verbatim, so callers use this
    /// rather than `to_string()`.
    pub fn message(&self) -> String {
        match self {
            DbError::ConnectionConfigError(msg) => msg.clone(),
            DbError::ConnectionError(err) => err.to_string(),
        }
    }
}
