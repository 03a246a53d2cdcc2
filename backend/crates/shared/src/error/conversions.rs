//! Framework integration, each behind its feature flag

#[cfg(feature = "sqlx")]
pub use self::postgres::{PG_UNIQUE_VIOLATION, is_unique_violation};

#[cfg(feature = "sqlx")]
mod postgres {
    /// SQLSTATE `unique_violation`
    pub const PG_UNIQUE_VIOLATION: &str = "23505";

    /// Whether a query failed on a unique index
    pub fn is_unique_violation(err: &sqlx::Error) -> bool {
        match err {
            sqlx::Error::Database(db_err) => db_err
                .code()
                .is_some_and(|code| code.as_ref() == PG_UNIQUE_VIOLATION),
            _ => false,
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_non_database_errors_are_not_unique_violations() {
            assert!(!is_unique_violation(&sqlx::Error::RowNotFound));
            assert!(!is_unique_violation(&sqlx::Error::PoolTimedOut));
        }
    }
}

/// `{ statusCode, error, message, action? }`
#[cfg(feature = "axum")]
impl axum::response::IntoResponse for super::app_error::AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;
        use axum::http::StatusCode;

        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut body = serde_json::json!({
            "statusCode": self.status_code(),
            "error": self.kind().as_str(),
            "message": self.public_message(),
        });
        if let Some(action) = self.action() {
            body["action"] = serde_json::Value::String(action.to_string());
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(all(test, feature = "axum"))]
mod response_tests {
    use axum::body::to_bytes;
    use axum::response::IntoResponse;

    use crate::error::app_error::AppError;
    use crate::error::kind::ErrorKind;

    async fn body_of(err: AppError) -> (u16, serde_json::Value) {
        let response = err.into_response();
        let status = response.status().as_u16();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_client_error_body() {
        let (status, body) = body_of(
            AppError::bad_request("Password is too short").with_action("Choose a longer one"),
        )
        .await;

        assert_eq!(status, 400);
        assert_eq!(body["statusCode"], 400);
        assert_eq!(body["error"], "Bad Request");
        assert_eq!(body["message"], "Password is too short");
        assert_eq!(body["action"], "Choose a longer one");
    }

    #[tokio::test]
    async fn test_server_error_body_is_generic() {
        let (status, body) = body_of(AppError::new(
            ErrorKind::InternalServerError,
            "pool timed out on db-1",
        ))
        .await;

        assert_eq!(status, 500);
        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("action").is_none());
    }
}
