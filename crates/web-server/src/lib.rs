use axum::{middleware::from_fn_with_state, routing::get, Router};
use configuration::Settings;
use database::MongoConnector;
use status_tracker::{status_cell, EnsureConnected, RetryPolicy, StatusReader, TokioScheduler};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
// Note: Tracing is initialized by the binary, not here.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod page;

use crate::error::AppError;
use crate::page::StatusPage;

/// The shared application state that all handlers can access.
pub struct AppState {
    pub status: StatusReader,
    pub connection: Arc<dyn EnsureConnected>,
    pub page: StatusPage,
}

impl AppState {
    pub fn new(
        status: StatusReader,
        connection: Arc<dyn EnsureConnected>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            status,
            connection,
            page: StatusPage::new()?,
        })
    }
}

/// Builds the application router: one page, guarded by the readiness check.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::status_page))
        // `route_layer` so unmatched paths 404 without touching the database.
        .route_layer(from_fn_with_state(state.clone(), middleware::require_connection))
        .with_state(state)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// The main function to configure and run the web server.
///
/// Returns after a shutdown signal, once the database connection is closed.
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        mode = %settings.mode,
        database = %database::redact(&settings.database.uri),
        "Configuring connection tracker."
    );
    let connector = Arc::new(MongoConnector::new(settings.database.clone()));
    let (writer, reader) = status_cell();
    let connection = status_tracker::for_mode(
        settings.mode,
        connector,
        writer,
        RetryPolicy::from(&settings.retry),
        Arc::new(TokioScheduler),
    );
    let app_state = Arc::new(AppState::new(reader, connection.clone())?);

    connection.start();

    let listener =
        tokio::net::TcpListener::bind((settings.server.host.as_str(), settings.server.port)).await?;
    let addr = listener.local_addr()?;
    tracing::info!(mode = %settings.mode, "Web server listening on http://{}", addr);

    axum::serve(listener, router(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    connection.tracker().shutdown().await;
    tracing::info!("Web server stopped.");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install the Ctrl+C handler.");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install the SIGTERM handler.");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received.");
}
