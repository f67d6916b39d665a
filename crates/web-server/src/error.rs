use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use status_tracker::TrackerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database connection error: {0}")]
    Connection(#[from] TrackerError),
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Connection(conn_err) => {
                tracing::error!(error = %conn_err, "Database connection error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database connection failed".to_string(),
                )
            }
            AppError::Template(template_err) => {
                tracing::error!(error = ?template_err, "Template error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "The status page could not be rendered".to_string(),
                )
            }
        };

        let body = Json(json!({ "error": error_message }));
        (status, body).into_response()
    }
}
