use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use settings::{
    DatabaseSettings, DeploymentMode, LoggingSettings, RetrySettings, ServerSettings, Settings,
    WriteConcernSettings,
};

/// Prefix for environment variables that map onto the settings tree,
/// e.g. `MONGO_STATUS__SERVER__PORT=8080`.
pub const ENV_PREFIX: &str = "MONGO_STATUS";

/// Loads the application configuration.
///
/// Sources are layered: built-in defaults, then the optional TOML file at `path`,
/// then `MONGO_STATUS__*` variables, then the well-known variables handled by
/// [`apply_env_overrides`]. The result is validated before it is returned.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

/// Same as [`load_settings`], with the well-known variables read through `lookup`.
pub fn load_settings_with<F>(path: &Path, lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let builder = config::Config::builder()
        // A missing file is fine; every field has a default.
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let mut settings = builder.try_deserialize::<Settings>()?;
    settings.database.uri = settings.database.uri.trim().to_string();
    apply_env_overrides(&mut settings, lookup)?;
    settings.validate()?;
    Ok(settings)
}

/// Applies the conventional variables hosting platforms set.
///
/// - `MONGODB_URI` (or `MONGO_URI`) replaces the connection string.
/// - `DEPLOYMENT_MODE` selects the deployment mode by name.
/// - `VERCEL`, when non-empty, forces per-request mode.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(uri) = non_empty("MONGODB_URI").or_else(|| non_empty("MONGO_URI")) {
        settings.database.uri = uri.trim().to_string();
    }
    if let Some(mode) = non_empty("DEPLOYMENT_MODE") {
        settings.mode = mode.parse()?;
    }
    if non_empty("VERCEL").is_some() {
        settings.mode = DeploymentMode::PerRequest;
    }
    Ok(())
}
