use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{AuthError, DirectoryError, FileError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ValidationError(String),

    Conflict(String),

    InternalError(String),

    Unauthorized(String),

    Forbidden(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            Self::Forbidden(msg) => write!(f, "Forbidden: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
        };

        let body = ApiResponse::<()>::error(error_message);
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

// Fixed mapping from the domain taxonomies onto HTTP statuses:
// NotFound -> 404, Forbidden -> 403, validation-class failures -> 400,
// duplicate email -> 409, store failures -> opaque 500.

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::PasswordNotSet => {
                Self::Unauthorized(err.to_string())
            }
            AuthError::AccountDeactivated => Self::Forbidden(err.to_string()),
            AuthError::EmailTaken => Self::Conflict(err.to_string()),
            AuthError::InvalidResetToken | AuthError::Validation(_) => {
                Self::ValidationError(err.to_string())
            }
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound => Self::NotFound(err.to_string()),
            DirectoryError::Validation(_)
            | DirectoryError::InvalidTarget
            | DirectoryError::InvalidRole
            | DirectoryError::InactiveManager => Self::ValidationError(err.to_string()),
            DirectoryError::Forbidden(msg) => Self::Forbidden(msg),
            DirectoryError::EmailTaken => Self::Conflict(err.to_string()),
            DirectoryError::Database(msg) => Self::DatabaseError(msg),
            DirectoryError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<FileError> for ApiError {
    fn from(err: FileError) -> Self {
        match err {
            FileError::NotFound | FileError::UserNotFound => Self::NotFound(err.to_string()),
            FileError::Forbidden(msg) => Self::Forbidden(msg),
            FileError::Validation(_) => Self::ValidationError(err.to_string()),
            FileError::Database(msg) => Self::DatabaseError(msg),
            FileError::Storage(msg) => Self::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn user_not_found(id: i32) -> Self {
        Self::NotFound(format!("User {id} not found"))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }
}
