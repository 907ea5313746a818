//! Application error taxonomy.
//!
//! A single `AppError` enum covers every failure the services surface.
//! Failures are user-facing (re-prompt for login, fix the request) or
//! request-aborting; there is no retry layer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::response::ApiResponse;

/// Convenience alias used throughout the services.
pub type AppResult<T> = Result<T, AppError>;

/// All errors the services produce.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// No usable credentials: the client has to (re-)authenticate.
    /// Covers missing cookies, undecryptable cookies, and rejected logins.
    #[error("login required: {0}")]
    LoginRequired(String),

    /// Authenticated but not allowed.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Unknown server id.
    #[error("server not found: {0}")]
    ServerNotFound(String),

    /// Database (or other navigation object) does not exist.
    #[error("database not found: {0}")]
    DatabaseNotFound(String),

    /// Could not open a connection to the target MySQL server.
    #[error("database connection failed: {0}")]
    DatabaseConnection(String),

    /// A query against the target MySQL server failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(String),

    /// A downstream service call failed.
    #[error("external service error: {0}")]
    ExternalService(String),

    /// Anything unexpected.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable error code for the response envelope.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::LoginRequired(_) => "LOGIN_REQUIRED",
            AppError::AccessDenied(_) => "ACCESS_DENIED",
            AppError::ServerNotFound(_) => "SERVER_NOT_FOUND",
            AppError::DatabaseNotFound(_) => "DATABASE_NOT_FOUND",
            AppError::DatabaseConnection(_) => "DATABASE_CONNECTION_FAILED",
            AppError::DatabaseQuery(_) => "DATABASE_QUERY_FAILED",
            AppError::ExternalService(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// HTTP status the error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::LoginRequired(_) => StatusCode::UNAUTHORIZED,
            AppError::AccessDenied(_) => StatusCode::FORBIDDEN,
            AppError::ServerNotFound(_) | AppError::DatabaseNotFound(_) => StatusCode::NOT_FOUND,
            AppError::DatabaseConnection(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseQuery(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        }
        let body = ApiResponse::err(self.code(), self.to_string());
        (status, Json(body)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_required_maps_to_401() {
        let err = AppError::LoginRequired("no cookie".into());
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.code(), "LOGIN_REQUIRED");
    }

    #[test]
    fn test_connection_failure_is_upstream_error() {
        let err = AppError::DatabaseConnection("refused".into());
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }
}
