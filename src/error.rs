//! Error types for eLibrary server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::services::ledger::LedgerError;

/// Machine-readable error codes returned alongside every error message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Failure = 1,
    DbFailure = 2,
    NoSuchData = 3,
    BadValue = 4,
    Duplicate = 5,
    MethodNotAllowed = 6,
    Overdue = 7,
    OutOfStock = 8,
    StockShortage = 9,
    AlreadySettled = 10,
    StockOverflow = 11,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// Uniqueness violation; `url` points at the record already holding the value
    #[error("Conflict: {message}")]
    Conflict { message: String, url: Option<String> },

    #[error("Business rule violation: {0}")]
    BusinessRule(#[from] LedgerError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn conflict(message: impl Into<String>, url: impl Into<String>) -> Self {
        AppError::Conflict {
            message: message.into(),
            url: Some(url.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Conflict { .. } | AppError::BusinessRule(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound(_) => ErrorCode::NoSuchData,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::MethodNotAllowed(_) => ErrorCode::MethodNotAllowed,
            AppError::Conflict { .. } => ErrorCode::Duplicate,
            AppError::BusinessRule(rule) => match rule {
                LedgerError::Overdue { .. } => ErrorCode::Overdue,
                LedgerError::OutOfStock => ErrorCode::OutOfStock,
                LedgerError::StockShortage { .. } => ErrorCode::StockShortage,
                LedgerError::AlreadySettled { .. } => ErrorCode::AlreadySettled,
                LedgerError::StockOverflow { .. } => ErrorCode::StockOverflow,
            },
            AppError::Database(_) => ErrorCode::DbFailure,
            AppError::Internal(_) => ErrorCode::Failure,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, url) = match self {
            AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::MethodNotAllowed(msg) => (msg, None),
            AppError::Conflict { message, url } => (message, url),
            AppError::BusinessRule(rule) => (rule.to_string(), None),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                ("Database error".to_string(), None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("Internal server error".to_string(), None)
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
            url,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
