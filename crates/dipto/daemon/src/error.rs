//! Error types for diptod

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dipto_copywriter::CopyError;
use dipto_replica::ReplicaError;
use dipto_store::AuthError;
use serde::Serialize;
use thiserror::Error;

pub type DaemonResult<T> = Result<T, DaemonError>;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("server error: {0}")]
    Server(String),

    #[error(transparent)]
    Replica(#[from] ReplicaError),

    #[error("description failed: {0}")]
    Copy(#[from] CopyError),
}

impl From<config::ConfigError> for DaemonError {
    fn from(e: config::ConfigError) -> Self {
        DaemonError::Config(e.to_string())
    }
}

/// Errors returned by the REST handlers
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Mutations need the privileged identity.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Replica(#[from] ReplicaError),

    #[error(transparent)]
    Copy(#[from] CopyError),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    fn status(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            ApiError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE"),
            ApiError::Replica(err) => match err {
                ReplicaError::WriteFailed { .. } => (StatusCode::BAD_GATEWAY, "WRITE_FAILED"),
                ReplicaError::ItemNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                ReplicaError::Decode(_) | ReplicaError::Draft(_) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
                }
                ReplicaError::Auth(AuthError::InvalidCredentials) => {
                    (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS")
                }
                ReplicaError::Auth(AuthError::AccountExists(_)) => (StatusCode::CONFLICT, "ACCOUNT_EXISTS"),
                ReplicaError::Auth(AuthError::WeakSecret { .. }) => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "WEAK_SECRET")
                }
                ReplicaError::Auth(AuthError::Provider(_)) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
                ReplicaError::AlreadyRunning => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
            ApiError::Copy(CopyError::MissingTitle) => (StatusCode::BAD_REQUEST, "MISSING_TITLE"),
            ApiError::Copy(_) => (StatusCode::BAD_GATEWAY, "COPYWRITER_FAILED"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status();
        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
