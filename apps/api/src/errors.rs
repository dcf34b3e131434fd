use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::document::extractor::DocumentError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Parse failure: {0}")]
    ParseFailure(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Upstream failure: {0}")]
    Upstream(String),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::UnsupportedInput(_) => "UNSUPPORTED_INPUT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::ParseFailure(_) => "PARSE_FAILURE",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Upstream(_) => "UPSTREAM_FAILURE",
            AppError::Persistence(_) => "PERSISTENCE_FAILURE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::UnsupportedInput(_)
            | AppError::Validation(_)
            | AppError::ParseFailure(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DocumentError> for AppError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::FileNotFound(path) => {
                AppError::NotFound(format!("document {} does not exist", path.display()))
            }
            DocumentError::UnsupportedFileType(_) => AppError::UnsupportedInput(err.to_string()),
            DocumentError::Parse(_) => AppError::ParseFailure(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::NotFound(msg)
            | AppError::UnsupportedInput(msg)
            | AppError::Validation(msg)
            | AppError::ParseFailure(msg)
            | AppError::Conflict(msg) => msg.clone(),
            AppError::Upstream(msg) => {
                tracing::error!("Upstream failure: {msg}");
                "The interview model is currently unavailable".to_string()
            }
            AppError::Persistence(e) => {
                tracing::error!("Persistence failure: {e}");
                "A database error occurred".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                "An internal server error occurred".to_string()
            }
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
