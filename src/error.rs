//! Error types for the Promptbook server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::ocr::OcrError;
use crate::refine::RefineError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Authentication required")]
    AuthRequired,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error(transparent)]
    Refine(#[from] RefineError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),
}

/// Error response body. Both inference endpoints and the prompt API
/// return failures as `{ "error": "<human-readable message>" }`.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::AuthRequired => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
            ),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            AppError::Ocr(e) => {
                tracing::error!("OCR error: {}", e);
                (e.status_code(), e.to_string())
            }
            AppError::Refine(e) => {
                tracing::error!("Refinement error: {}", e);
                (e.status_code(), e.to_string())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Multipart(e) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid multipart body: {}", e),
            ),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
