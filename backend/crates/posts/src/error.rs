//! Posts Error Types
//!
//! The discriminated result of every post operation, rendered as
//! `kernel::error::AppError` at the HTTP boundary.

use auth::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::storage::StorageError;
use thiserror::Error;

use crate::domain::entity::post::MAX_POST_FILES;

pub type PostResult<T> = Result<T, PostError>;

#[derive(Debug, Error)]
pub enum PostError {
    /// Absent post or malformed id
    #[error("Post not found")]
    NotFound,

    /// The caller does not own the post
    #[error("Only the owner may modify this post")]
    Forbidden,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("You can only upload up to {} files", MAX_POST_FILES)]
    TooManyFiles,

    /// Only verified users may report issues
    #[error("Your address must be verified before reporting issues")]
    Unauthorized,

    #[error("{0}")]
    Conflict(String),

    #[error("Identity error: {0}")]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PostError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PostError::NotFound => StatusCode::NOT_FOUND,
            PostError::Forbidden => StatusCode::FORBIDDEN,
            PostError::InvalidArgument(_) | PostError::TooManyFiles => StatusCode::BAD_REQUEST,
            PostError::Unauthorized => StatusCode::UNAUTHORIZED,
            PostError::Conflict(_) => StatusCode::CONFLICT,
            PostError::Auth(e) => e.status_code(),
            PostError::Database(_) | PostError::Storage(_) | PostError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PostError::NotFound => ErrorKind::NotFound,
            PostError::Forbidden => ErrorKind::Forbidden,
            PostError::InvalidArgument(_) | PostError::TooManyFiles => ErrorKind::BadRequest,
            PostError::Unauthorized => ErrorKind::Unauthorized,
            PostError::Conflict(_) => ErrorKind::Conflict,
            PostError::Auth(e) => e.kind(),
            PostError::Database(_) | PostError::Storage(_) | PostError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    /// Client-facing error. Backend failures carry no detail.
    pub fn to_app_error(&self) -> AppError {
        match self {
            PostError::Auth(e) => e.to_app_error(),
            PostError::Database(_) | PostError::Storage(_) | PostError::Internal(_) => {
                AppError::internal("Internal server error")
            }
            PostError::Unauthorized => AppError::new(self.kind(), self.to_string())
                .with_action("Upload an ID document and wait for a moderator"),
            _ => AppError::new(self.kind(), self.to_string()),
        }
    }

    fn log(&self) {
        match self {
            PostError::Database(e) => {
                tracing::error!(error = %e, "Posts database error");
            }
            PostError::Storage(e) => {
                tracing::error!(error = %e, "Posts storage error");
            }
            PostError::Internal(msg) => {
                tracing::error!(message = %msg, "Posts internal error");
            }
            PostError::Forbidden => {
                tracing::warn!("Rejected post write by non-owner");
            }
            _ => {
                tracing::debug!(error = %self, "Posts error");
            }
        }
    }
}

impl IntoResponse for PostError {
    fn into_response(self) -> Response {
        match self {
            // Auth logs its own way
            PostError::Auth(e) => e.into_response(),
            other => {
                other.log();
                other.to_app_error().into_response()
            }
        }
    }
}
