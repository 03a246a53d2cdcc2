//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use thiserror::Error;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

/// Auth-specific error variants
#[derive(Debug, Error)]
pub enum AuthError {
    /// Malformed or missing input, bad verification code, missing provider email
    #[error("{0}")]
    BadRequest(String),

    /// Failed credential check or missing/invalid bearer token
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// Duplicate account on sign-up
    #[error("{0}")]
    Conflict(String),

    /// Missing secret or provider credentials
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Federated identity already attached to a different account
    #[error("{0}")]
    AccountConflict(String),

    /// Signature mismatch, malformed payload or expiry
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The identity provider rejected the assertion
    #[error("OAuth provider rejected the request: {0}")]
    OAuthProvider(String),

    /// The identity provider could not be reached
    #[error("OAuth provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Mail error: {0}")]
    Mail(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        AuthError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        AuthError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        AuthError::NotFound(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.kind().status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::BadRequest(_) => ErrorKind::BadRequest,
            AuthError::Unauthorized(_)
            | AuthError::InvalidToken(_)
            | AuthError::OAuthProvider(_) => ErrorKind::Unauthorized,
            AuthError::NotFound(_) => ErrorKind::NotFound,
            AuthError::Conflict(_) | AuthError::AccountConflict(_) => ErrorKind::Conflict,
            AuthError::ProviderUnavailable(_) => ErrorKind::BadGateway,
            AuthError::Configuration(_)
            | AuthError::Database(_)
            | AuthError::Cache(_)
            | AuthError::Mail(_)
            | AuthError::Internal(_) => ErrorKind::InternalServerError,
        }
    }

    /// Failures caused by the server rather than by the caller's input
    pub fn is_server_error(&self) -> bool {
        self.kind().is_server_error()
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        AppError::new(self.kind(), self.to_string())
    }

    /// Log the error with appropriate level
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Configuration(msg) => {
                tracing::error!(message = %msg, "Auth configuration error");
            }
            AuthError::Cache(msg) => {
                tracing::error!(message = %msg, "Auth cache error");
            }
            AuthError::Mail(msg) => {
                tracing::error!(message = %msg, "Auth mail error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::ProviderUnavailable(msg) => {
                tracing::error!(message = %msg, "Identity provider unavailable");
            }
            AuthError::OAuthProvider(msg) => {
                tracing::warn!(message = %msg, "Identity provider rejected assertion");
            }
            AuthError::AccountConflict(msg) => {
                tracing::warn!(message = %msg, "Federated account conflict");
            }
            AuthError::InvalidToken(reason) => {
                tracing::debug!(reason = %reason, "Rejected token");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        let message = err.message().to_string();
        match err.kind() {
            ErrorKind::BadRequest => AuthError::BadRequest(message),
            ErrorKind::Unauthorized => AuthError::Unauthorized(message),
            ErrorKind::NotFound => AuthError::NotFound(message),
            ErrorKind::Conflict => AuthError::Conflict(message),
            _ => AuthError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::bad_request("x").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::unauthorized("x").status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AuthError::Conflict("x".into()).status_code(), StatusCode::CONFLICT);
        assert_eq!(
            AuthError::AccountConflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AuthError::InvalidToken("expired".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::Configuration("JWT_SECRET".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AuthError::ProviderUnavailable("timeout".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_server_error_classification() {
        assert!(AuthError::Internal("boom".into()).is_server_error());
        assert!(AuthError::Database(sqlx::Error::PoolTimedOut).is_server_error());
        assert!(!AuthError::bad_request("missing").is_server_error());
        assert!(!AuthError::Conflict("taken".into()).is_server_error());
    }

    #[test]
    fn test_from_app_error_keeps_client_kinds() {
        let err: AuthError = AppError::bad_request("Invalid email format").into();
        assert!(matches!(err, AuthError::BadRequest(ref m) if m == "Invalid email format"));

        let err: AuthError = AppError::internal("boom").into();
        assert!(matches!(err, AuthError::Internal(_)));
    }

    #[test]
    fn test_client_message_is_verbatim() {
        let err = AuthError::unauthorized("Invalid email or password");
        assert_eq!(err.to_app_error().public_message(), "Invalid email or password");

        let err = AuthError::Mail("smtp 550 mailbox unavailable".into());
        assert_eq!(err.to_app_error().public_message(), "Internal server error");
    }
}
