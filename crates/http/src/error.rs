//! Error handling for the shelf HTTP layer.
//!
//! Handlers return `Result<_, AppError>` and let the error escape; the
//! `IntoResponse` impl below is the single place that turns it into an error
//! page.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use shelf_db::StoreError;
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::html;

/// Contents of a rendered error page
#[derive(Debug)]
pub struct ErrorBody {
    pub status: StatusCode,
    pub message: String,
    pub code: String,
    pub trace_id: String,
    pub timestamp: String,
}

impl ErrorBody {
    fn render(&self) -> String {
        let body = format!(
            "<p class=\"error-message\">{message}</p>\n\
             <dl>\n\
             <dt>Code</dt><dd>{code}</dd>\n\
             <dt>Trace ID</dt><dd>{trace_id}</dd>\n\
             <dt>Time</dt><dd>{timestamp}</dd>\n\
             </dl>",
            message = html::escape(&self.message),
            code = html::escape(&self.code),
            trace_id = html::escape(&self.trace_id),
            timestamp = html::escape(&self.timestamp),
        );
        let title = format!(
            "{} {}",
            self.status.as_u16(),
            self.status.canonical_reason().unwrap_or("Error")
        );
        html::layout(&title, &body)
    }
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {message}")]
    NotFound { message: String, code: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: "not_found".to_string(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        Self::Internal(anyhow::Error::new(error).context("document store failure"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let timestamp = OffsetDateTime::now_utc().to_string();

        let (status, error_code, message) = match self {
            AppError::NotFound { message, code } => (StatusCode::NOT_FOUND, code, message),
            AppError::Internal(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error".to_string(),
                format!("{e:#}"),
            ),
        };

        tracing::error!(
            error_id = %error_id,
            error_code = %error_code,
            status_code = %status.as_u16(),
            message = %message,
            "Request error"
        );

        // Internal details stay in the log for release builds
        let message = if cfg!(not(debug_assertions)) && status == StatusCode::INTERNAL_SERVER_ERROR
        {
            "An internal server error occurred".to_string()
        } else {
            message
        };

        let body = ErrorBody {
            status,
            message,
            code: error_code,
            trace_id: error_id.to_string(),
            timestamp,
        };

        (status, Html(body.render())).into_response()
    }
}
