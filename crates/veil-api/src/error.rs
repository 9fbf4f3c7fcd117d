//! Veil — API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use veil_core::error::DomainError;
use veil_stream::HubError;

/// Startup errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying migrations failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),

    /// The tracing pipeline could not be installed.
    #[error("telemetry error: {0}")]
    Telemetry(String),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// Errors a request handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A domain operation failed.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// No session, or one that does not verify.
    #[error("unauthorized: {0}")]
    Unauthorized(&'static str),

    /// A player tried an administrator route.
    #[error("forbidden: administrator only")]
    Forbidden,

    /// The event hub has stopped.
    #[error(transparent)]
    HubUnavailable(#[from] HubError),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Domain(DomainError::NotFound { .. }) => (StatusCode::NOT_FOUND, "not_found"),
            Self::Domain(DomainError::InvalidState(_)) => (StatusCode::CONFLICT, "invalid_state"),
            Self::Domain(DomainError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "validation_error")
            }
            Self::Domain(DomainError::Store(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "store_error")
            }
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
            Self::HubUnavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "hub_unavailable"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorBody {
            error: error_code,
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
