//! Error handling module
//!
//! Centralized error types and HTTP response conversion. Every failure kind
//! maps to a stable (status, error_code) pair so clients can discriminate
//! "not allowed" from "not possible" from "transient".

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::rates::RateError;

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Access denied")]
    AccessDenied,

    #[error("Invalid API key")]
    Unauthenticated,

    // Domain errors
    #[error(transparent)]
    Domain(#[from] crate::domain::DomainError),

    // Upstream errors
    #[error("Exchange rate unavailable: {0}")]
    RateUnavailable(#[from] RateError),

    // Server errors (5xx)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl From<crate::domain::MoneyError> for AppError {
    fn from(err: crate::domain::MoneyError) -> Self {
        AppError::Domain(err.into())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub error_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, details) = match &self {
            // 400 Bad Request
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", Some(msg.clone()))
            }

            // 401 Unauthorized
            AppError::Unauthenticated => {
                (StatusCode::UNAUTHORIZED, "invalid_api_key", None)
            }

            // 403 Forbidden
            AppError::AccessDenied => {
                (StatusCode::FORBIDDEN, "access_denied", None)
            }

            // Domain errors - map to appropriate HTTP status
            AppError::Domain(ref domain_err) => {
                use crate::domain::DomainError;
                match domain_err {
                    DomainError::InsufficientFunds { .. } => {
                        (StatusCode::BAD_REQUEST, "insufficient_funds", Some(domain_err.to_string()))
                    }
                    DomainError::SameAccountTransfer => {
                        (StatusCode::BAD_REQUEST, "same_account_transfer", None)
                    }
                    DomainError::InvalidAmount(_) => {
                        (StatusCode::BAD_REQUEST, "invalid_amount", Some(domain_err.to_string()))
                    }
                    DomainError::DestinationNotFound(id) => {
                        (StatusCode::NOT_FOUND, "destination_not_found", Some(id.to_string()))
                    }
                    DomainError::AccountNotFound(id) => {
                        (StatusCode::NOT_FOUND, "account_not_found", Some(id.to_string()))
                    }
                    DomainError::OperationNotFound(id) => {
                        (StatusCode::NOT_FOUND, "operation_not_found", Some(id.to_string()))
                    }
                }
            }

            // 502 Bad Gateway - the oracle is an upstream dependency
            AppError::RateUnavailable(e) => {
                tracing::warn!("Rate oracle failure: {}", e);
                (StatusCode::BAD_GATEWAY, "rate_unavailable", None)
            }

            // 500 Internal Server Error
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "database_error", None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", None)
            }
        };

        let body = ErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}
