//! Error types for the portfolio server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// SQLSTATE reported by Postgres for a unique constraint violation
const UNIQUE_VIOLATION: &str = "23505";

/// Stable error codes exposed to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    NotAuthorized = 2,
    NotFound = 3,
    InvalidInput = 4,
    DuplicateKey = 5,
    StorageUnavailable = 6,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Whether the error came from the backing store (either variant)
    pub fn is_storage(&self) -> bool {
        matches!(self, AppError::StorageUnavailable(_) | AppError::DuplicateKey(_))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                return AppError::DuplicateKey(db_err.message().to_string());
            }
        }
        AppError::StorageUnavailable(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<crate::theme::ColorError> for AppError {
    fn from(err: crate::theme::ColorError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Numeric error code
    pub code: u32,
    /// Error code name, e.g. `InvalidInput`
    pub error: String,
    /// Human readable description
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::StorageUnavailable(msg) => {
                tracing::error!("Storage error: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorCode::StorageUnavailable,
                    "Storage unavailable".to_string(),
                )
            }
            AppError::DuplicateKey(msg) => {
                tracing::warn!("Duplicate key: {}", msg);
                (
                    StatusCode::CONFLICT,
                    ErrorCode::DuplicateKey,
                    "Concurrent update, please retry".to_string(),
                )
            }
            AppError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, msg.clone())
            }
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorCode::NotFound, msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
