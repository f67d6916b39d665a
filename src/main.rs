use clap::Parser;
use configuration::{load_settings, DeploymentMode, LoggingSettings};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Serves a one-page report of whether MongoDB is reachable.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. A missing file means defaults.
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    /// Overrides `server.host`.
    #[arg(long)]
    host: Option<String>,

    /// Overrides `server.port`.
    #[arg(long)]
    port: Option<u16>,

    /// Overrides the deployment mode from the file and environment.
    #[arg(long, value_enum)]
    mode: Option<DeploymentMode>,
}

/// The main entry point for the status server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file, if there is one.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut settings = load_settings(&cli.config)?;
    if let Some(host) = cli.host {
        settings.server.host = host;
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    if let Some(mode) = cli.mode {
        settings.mode = mode;
    }

    let _log_guard = init_tracing(&settings.logging)?;
    tracing::info!(
        config = %cli.config.display(),
        mode = %settings.mode,
        "Starting mongo-status."
    );

    web_server::run_server(settings).await
}

/// Installs the global subscriber: stdout always, plus a daily file when configured.
///
/// The returned guard flushes the file writer on drop and must outlive the server.
fn init_tracing(logging: &LoggingSettings) -> anyhow::Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&logging.filter))?;

    let (file_layer, guard) = match &logging.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "mongo-status.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()?;

    Ok(guard)
}
