//! Auth Error Types
//!
//! Auth-specific variants that integrate with `kernel::error::AppError`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::storage::StorageError;
use thiserror::Error;

use crate::domain::value_object::user_role::UserRole;

pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("User not found")]
    UserNotFound,

    #[error("Profile picture not found")]
    ProfilePictureNotFound,

    #[error("ID document not found")]
    IdDocumentNotFound,

    #[error("Email already in use")]
    EmailTaken,

    /// Known email, wrong password
    #[error("Wrong password")]
    WrongPassword,

    #[error("Missing bearer token")]
    TokenMissing,

    #[error("Invalid bearer token")]
    TokenInvalid,

    #[error("Bearer token expired")]
    TokenExpired,

    #[error("This action requires the {required} role")]
    InsufficientRole { required: UserRole },

    #[error("User has no address to verify")]
    AddressMissing,

    #[error("{0}")]
    Validation(String),

    #[error("Password validation failed: {0}")]
    PasswordValidation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::UserNotFound
            | AuthError::ProfilePictureNotFound
            | AuthError::IdDocumentNotFound => StatusCode::NOT_FOUND,
            AuthError::EmailTaken => StatusCode::CONFLICT,
            AuthError::WrongPassword | AuthError::InsufficientRole { .. } => StatusCode::FORBIDDEN,
            AuthError::TokenMissing | AuthError::TokenInvalid | AuthError::TokenExpired => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::AddressMissing => StatusCode::UNPROCESSABLE_ENTITY,
            AuthError::Validation(_) | AuthError::PasswordValidation(_) => StatusCode::BAD_REQUEST,
            AuthError::Storage(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::UserNotFound
            | AuthError::ProfilePictureNotFound
            | AuthError::IdDocumentNotFound => ErrorKind::NotFound,
            AuthError::EmailTaken => ErrorKind::Conflict,
            AuthError::WrongPassword | AuthError::InsufficientRole { .. } => ErrorKind::Forbidden,
            AuthError::TokenMissing | AuthError::TokenInvalid | AuthError::TokenExpired => {
                ErrorKind::Unauthorized
            }
            AuthError::AddressMissing => ErrorKind::UnprocessableEntity,
            AuthError::Validation(_) | AuthError::PasswordValidation(_) => ErrorKind::BadRequest,
            AuthError::Storage(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Client-facing error. Backend failures carry no detail.
    pub fn to_app_error(&self) -> AppError {
        match self {
            AuthError::Storage(_) | AuthError::Database(_) | AuthError::Internal(_) => {
                AppError::internal("Internal server error")
            }
            AuthError::TokenMissing | AuthError::TokenExpired => {
                AppError::new(self.kind(), self.to_string()).with_action("Please log in again")
            }
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::Storage(e) => {
                tracing::error!(error = %e, "Auth storage error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::WrongPassword => {
                tracing::warn!("Login attempt with wrong password");
            }
            AuthError::TokenInvalid => {
                tracing::warn!("Rejected bearer token with bad signature or format");
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
