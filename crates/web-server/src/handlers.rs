use crate::{error::AppError, AppState};
use axum::{extract::State, response::Html};
use std::sync::Arc;

/// # GET /
/// Renders the status page. Always 200: the page reports failures, it does not fail.
pub async fn status_page(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let snapshot = state.status.get();
    let body = state.page.render(&snapshot, state.connection.mode())?;
    Ok(Html(body))
}
