//! Application error handling
//!
//! This module provides unified error handling for the API,
//! converting internal errors to appropriate HTTP responses.

use crate::repositories::RepositoryError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jingle_shared::{AuthError, ErrorResponse};
use thiserror::Error;
use tracing::error;

/// API error type that can be converted to HTTP responses
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("Database error")]
    Database(#[from] sqlx::Error),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidInput(msg) => ApiError::Validation(msg),
            err if err.requires_reauthentication() => ApiError::Unauthorized(err.to_string()),
            err => ApiError::Internal(err.into()),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::UsernameTaken | RepositoryError::EmailTaken => {
                ApiError::Conflict(err.to_string())
            }
            RepositoryError::NotFound(_) => ApiError::BadRequest(err.to_string()),
            RepositoryError::Database(e) => ApiError::Database(e),
            RepositoryError::Other(e) => ApiError::Internal(e),
        }
    }
}

impl ApiError {
    /// Status code this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Internal(err) => {
                error!("Internal error: {:?}", err);
                "An internal error occurred".to_string()
            }
            ApiError::Database(err) => {
                error!("Database error: {:?}", err);
                "A database error occurred".to_string()
            }
            other => other.to_string(),
        };

        (self.status(), Json(ErrorResponse { error: message })).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_status() {
        let error = ApiError::Validation("Invalid input".to_string());
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_conflict_error_status() {
        let error: ApiError = RepositoryError::UsernameTaken.into();
        assert_eq!(error.to_string(), "Username already taken");
        assert_eq!(error.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_auth_errors_are_unauthorized() {
        for err in [AuthError::InvalidAuthKey, AuthError::ExpiredAuthKey] {
            assert!(err.requires_reauthentication());
            let message = err.to_string();
            let api: ApiError = err.into();
            assert_eq!(api.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(api.to_string(), message);
        }
    }

    #[test]
    fn test_short_password_is_bad_request() {
        let api: ApiError = AuthError::InvalidInput("too short".to_string()).into();
        assert_eq!(api.status(), StatusCode::BAD_REQUEST);
        assert_eq!(api.to_string(), "too short");
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let error = ApiError::Internal(anyhow::anyhow!("connection refused to 10.0.0.3"));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: ErrorResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(body.error, "An internal error occurred");
    }
}
