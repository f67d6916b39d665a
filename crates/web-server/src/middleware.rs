use crate::{error::AppError, AppState};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Runs the deployment strategy's readiness check before the handler.
///
/// In background mode this is a no-op. In per-request mode it connects inline
/// when no live connection exists, and a failure becomes a 500 for this request.
pub async fn require_connection(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    state.connection.ensure_connected().await?;
    Ok(next.run(request).await)
}
