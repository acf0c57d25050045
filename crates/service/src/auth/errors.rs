use thiserror::Error;

/// Business errors for auth workflows
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("email already registered")]
    DuplicateEmail,
    /// Covers both an unknown email and a wrong password.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
    #[error("refresh token not found or expired")]
    TokenNotFoundOrExpired,
    #[error("account not found")]
    AccountNotFound,
    #[error("hashing error: {0}")]
    HashingError(String),
    #[error("token issuance failed: {0}")]
    TokenIssuanceFailed(String),
    #[error("unable to publish login event: {0}")]
    EventPublishFailed(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 1001,
            AuthError::DuplicateEmail => 1002,
            AuthError::AccountNotFound => 1003,
            AuthError::InvalidCredentials => 1004,
            AuthError::InvalidToken => 1005,
            AuthError::TokenNotFoundOrExpired => 1006,
            AuthError::HashingError(_) => 1101,
            AuthError::TokenIssuanceFailed(_) => 1102,
            AuthError::EventPublishFailed(_) => 1103,
            AuthError::Repository(_) => 1200,
        }
    }

    /// Errors the caller caused, as opposed to failures inside the service or
    /// its collaborators.
    pub fn is_client_error(&self) -> bool {
        self.code() < 1100
    }
}

impl From<models::errors::ModelError> for AuthError {
    fn from(e: models::errors::ModelError) -> Self {
        match e {
            models::errors::ModelError::Validation(msg) => AuthError::Validation(msg),
            other => AuthError::Repository(other.to_string()),
        }
    }
}
