use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::repositories::RepositoryError;
use crate::services::auth_service::AuthServiceError;
use crate::services::chat_service::ChatServiceError;
use crate::services::user_service::UserServiceError;
use crate::services::verification_service::VerificationError;

// Type alias for Result with our AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Request-facing error taxonomy. Every handler failure funnels into one of
/// these variants; the JSON body carries a stable `code` tag so clients can
/// branch without parsing messages.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Authentication token is missing")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Please verify your email before logging in")]
    EmailNotVerified,

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    AccessDenied(String),

    #[error("{0}")]
    Dependency(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error")]
    Internal,
}

impl AppError {
    /// Stable machine-readable tag carried in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation",
            AppError::MissingToken => "missing_token",
            AppError::InvalidToken => "invalid_token",
            AppError::InvalidCredentials => "invalid_credentials",
            AppError::EmailNotVerified => "email_not_verified",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::AccessDenied(_) => "access_denied",
            AppError::Dependency(_) => "dependency",
            AppError::Database(_) | AppError::Internal => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::MissingToken
            | AppError::InvalidToken
            | AppError::InvalidCredentials
            | AppError::EmailNotVerified => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::AccessDenied(_) => StatusCode::FORBIDDEN,
            AppError::Dependency(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Storage failures are logged with detail but never echoed back.
        let message = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Internal server error".to_string()
            }
            AppError::Internal => "Internal server error".to_string(),
            other => other.to_string(),
        };

        let body = json!({
            "error": message,
            "code": self.code(),
        });

        (self.status(), Json(body)).into_response()
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(e) => AppError::Database(e),
            RepositoryError::NotFound => AppError::NotFound("Record not found".to_string()),
            RepositoryError::AlreadyExists => AppError::Conflict("Record already exists".to_string()),
        }
    }
}

impl From<VerificationError> for AppError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::InvalidEmail
            | VerificationError::WeakPassword
            | VerificationError::MissingFields
            | VerificationError::NoCodeIssued
            | VerificationError::Expired
            | VerificationError::Mismatch => AppError::Validation(err.to_string()),
            VerificationError::AlreadyRegistered | VerificationError::AlreadyVerified => {
                AppError::Conflict(err.to_string())
            }
            VerificationError::NotFound => AppError::NotFound(err.to_string()),
            VerificationError::Delivery(e) => AppError::Dependency(e.to_string()),
            VerificationError::Hashing(e) => {
                tracing::error!("Password hashing failed: {}", e);
                AppError::Internal
            }
            VerificationError::Token(e) => {
                tracing::error!("Token issuance failed: {}", e);
                AppError::Internal
            }
            VerificationError::Repository(e) => e.into(),
        }
    }
}

impl From<AuthServiceError> for AppError {
    fn from(err: AuthServiceError) -> Self {
        match err {
            AuthServiceError::InvalidCredentials => AppError::InvalidCredentials,
            AuthServiceError::EmailNotVerified => AppError::EmailNotVerified,
            AuthServiceError::Token(e) => {
                tracing::error!("Token issuance failed: {}", e);
                AppError::Internal
            }
            AuthServiceError::Repository(e) => e.into(),
        }
    }
}

impl From<ChatServiceError> for AppError {
    fn from(err: ChatServiceError) -> Self {
        match err {
            ChatServiceError::EmptyMessage | ChatServiceError::SelfMessage => {
                AppError::Validation(err.to_string())
            }
            ChatServiceError::RecipientNotFound | ChatServiceError::ConversationNotFound => {
                AppError::NotFound(err.to_string())
            }
            ChatServiceError::AccessDenied => AppError::AccessDenied(err.to_string()),
            ChatServiceError::Encryption(e) => {
                tracing::error!("Message encryption failed: {}", e);
                AppError::Internal
            }
            ChatServiceError::Repository(e) => e.into(),
        }
    }
}

impl From<UserServiceError> for AppError {
    fn from(err: UserServiceError) -> Self {
        match err {
            UserServiceError::WeakPassword | UserServiceError::PasswordMismatch => {
                AppError::Validation(err.to_string())
            }
            UserServiceError::UserNotFound => AppError::NotFound("User not found".to_string()),
            UserServiceError::HashingError(e) => {
                tracing::error!("Password hashing failed: {}", e);
                AppError::Internal
            }
            UserServiceError::Repository(e) => e.into(),
        }
    }
}
