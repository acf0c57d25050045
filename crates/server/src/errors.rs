use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use common::types::ApiResponse;
use service::auth::AuthError;
use thiserror::Error;
use tracing::{error, warn};

/// Error returned by handlers; rendered as the failure envelope.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, error: impl Into<String>) -> Self {
        Self { status, message: message.into(), error: error.into() }
    }

    pub fn unauthorized(error: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "Unauthorized", error)
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        let status = match &e {
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::DuplicateEmail => StatusCode::CONFLICT,
            AuthError::InvalidCredentials
            | AuthError::InvalidToken
            | AuthError::TokenNotFoundOrExpired => StatusCode::UNAUTHORIZED,
            AuthError::AccountNotFound => StatusCode::NOT_FOUND,
            AuthError::HashingError(_)
            | AuthError::TokenIssuanceFailed(_)
            | AuthError::EventPublishFailed(_)
            | AuthError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if e.is_client_error() {
            warn!(code = e.code(), error = %e, "request rejected");
            ApiError::new(status, e.to_string(), e.to_string())
        } else {
            // internals stay in the log
            error!(code = e.code(), error = %e, "request failed");
            ApiError::new(status, "Internal server error", "internal error")
        }
    }
}

/// Unreadable or incomplete request bodies.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(status = %rejection.status(), error = %rejection.body_text(), "request body rejected");
        ApiError::new(StatusCode::BAD_REQUEST, "Invalid request data", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body: ApiResponse<()> = ApiResponse::failure(self.message, self.error);
        (self.status, Json(body)).into_response()
    }
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database unavailable: {0}")]
    Database(String),
}
