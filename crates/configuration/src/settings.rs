use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub retry: RetrySettings,
    /// Selects how the connection is kept alive. See [`DeploymentMode`].
    pub mode: DeploymentMode,
    pub logging: LoggingSettings,
}

/// Where the HTTP listener binds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Connection string and driver tuning options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// The MongoDB connection string. Never commit credentials here;
    /// supply them through `MONGODB_URI` instead.
    pub uri: String,
    /// Reported to the server in the connection handshake.
    pub app_name: Option<String>,
    pub connect_timeout_ms: u64,
    /// How long the driver waits for a usable server before giving up.
    /// This bounds how quickly an unreachable host turns into a failure status.
    pub server_selection_timeout_ms: u64,
    pub max_pool_size: u32,
    pub min_pool_size: u32,
    pub heartbeat_frequency_ms: u64,
    pub retry_writes: bool,
    pub write_concern: WriteConcernSettings,
}

/// Write concern applied to the client. `w` accepts "majority", a node
/// count such as "1", or a custom tag set name.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WriteConcernSettings {
    pub w: String,
    pub timeout_ms: Option<u64>,
    pub journal: Option<bool>,
}

/// Controls the reconnect timer used in background mode.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub delay_secs: u64,
    /// Consecutive failures after which retries stop. Unset retries forever.
    pub max_attempts: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// An `EnvFilter` directive, overridden by `RUST_LOG` when that is set.
    pub filter: String,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub directory: Option<PathBuf>,
}

/// How the process keeps its database connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentMode {
    /// Connect once at startup and reconnect on a timer.
    #[default]
    Background,
    /// Serverless posture: connect lazily before each request that finds no live connection.
    #[serde(alias = "serverless")]
    #[cfg_attr(feature = "clap", value(alias = "serverless"))]
    PerRequest,
}

// --- Default Implementations ---

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            uri: "mongodb://127.0.0.1:27017".to_string(),
            app_name: Some("mongo-status".to_string()),
            connect_timeout_ms: 10_000,
            server_selection_timeout_ms: 5_000,
            max_pool_size: 10,
            min_pool_size: 0,
            heartbeat_frequency_ms: 10_000,
            retry_writes: true,
            write_concern: WriteConcernSettings::default(),
        }
    }
}

impl Default for WriteConcernSettings {
    fn default() -> Self {
        Self {
            w: "majority".to_string(),
            timeout_ms: None,
            journal: None,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            delay_secs: 5,
            max_attempts: None,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            directory: None,
        }
    }
}

impl DatabaseSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn server_selection_timeout(&self) -> Duration {
        Duration::from_millis(self.server_selection_timeout_ms)
    }

    pub fn heartbeat_frequency(&self) -> Duration {
        Duration::from_millis(self.heartbeat_frequency_ms)
    }
}

impl RetrySettings {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

impl Settings {
    /// Checks the invariants that deserialization alone cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let uri = self.database.uri.trim();
        if !(uri.starts_with("mongodb://") || uri.starts_with("mongodb+srv://")) {
            return Err(ConfigError::ValidationError(
                "database.uri must start with 'mongodb://' or 'mongodb+srv://'".to_string(),
            ));
        }
        if self.retry.delay_secs == 0 {
            return Err(ConfigError::ValidationError(
                "retry.delay_secs must be greater than zero".to_string(),
            ));
        }
        if self.retry.max_attempts == Some(0) {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be at least 1 when set".to_string(),
            ));
        }
        let db = &self.database;
        if db.connect_timeout_ms == 0
            || db.server_selection_timeout_ms == 0
            || db.heartbeat_frequency_ms == 0
        {
            return Err(ConfigError::ValidationError(
                "database timeouts must be greater than zero".to_string(),
            ));
        }
        if db.max_pool_size == 0 || db.max_pool_size < db.min_pool_size {
            return Err(ConfigError::ValidationError(format!(
                "database.max_pool_size ({}) must be non-zero and >= min_pool_size ({})",
                db.max_pool_size, db.min_pool_size
            )));
        }
        if db.write_concern.w.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "database.write_concern.w must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl FromStr for DeploymentMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "background" => Ok(DeploymentMode::Background),
            "per-request" | "per_request" | "serverless" => Ok(DeploymentMode::PerRequest),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentMode::Background => write!(f, "background"),
            DeploymentMode::PerRequest => write!(f, "per-request"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.retry.delay(), Duration::from_secs(5));
        assert_eq!(settings.mode, DeploymentMode::Background);
        assert!(!settings.database.uri.contains('@'));
    }

    #[test]
    fn rejects_non_mongodb_uri() {
        let mut settings = Settings::default();
        settings.database.uri = "postgres://localhost/db".to_string();
        assert!(matches!(settings.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn rejects_zero_retry_delay() {
        let mut settings = Settings::default();
        settings.retry.delay_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn rejects_inverted_pool_bounds() {
        let mut settings = Settings::default();
        settings.database.min_pool_size = 20;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn parses_mode_aliases() {
        assert_eq!("serverless".parse::<DeploymentMode>().unwrap(), DeploymentMode::PerRequest);
        assert_eq!("Per-Request".parse::<DeploymentMode>().unwrap(), DeploymentMode::PerRequest);
        assert_eq!("background".parse::<DeploymentMode>().unwrap(), DeploymentMode::Background);
        assert!(matches!("lambda".parse::<DeploymentMode>(), Err(ConfigError::UnknownMode(_))));
    }
}
