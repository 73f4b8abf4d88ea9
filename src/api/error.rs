use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::forms::FormErrors;
use crate::services::{MessageError, UserError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ValidationError(String),

    Form(FormErrors),

    Conflict(String),

    InternalError(String),

    Unauthorized(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "Not found: {msg}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::ValidationError(msg) => write!(f, "Validation error: {msg}"),
            Self::Form(errors) => write!(f, "Invalid form: {errors}"),
            Self::Conflict(msg) => write!(f, "Conflict: {msg}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, ApiResponse::<()>::error(msg)),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::error("A database error occurred"),
                )
            }
            Self::ValidationError(msg) => (StatusCode::BAD_REQUEST, ApiResponse::error(msg)),
            Self::Form(errors) => (
                StatusCode::BAD_REQUEST,
                ApiResponse::error("Invalid form submission").with_errors(errors),
            ),
            Self::Conflict(msg) => (StatusCode::CONFLICT, ApiResponse::error(msg)),
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiResponse::error("An internal error occurred"),
                )
            }
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, ApiResponse::error(msg)),
        };

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<FormErrors> for ApiError {
    fn from(errors: FormErrors) -> Self {
        Self::Form(errors)
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::UsernameTaken | UserError::EmailTaken | UserError::AlreadyTaken => {
                Self::Conflict(err.to_string())
            }
            UserError::InvalidCredentials => Self::Unauthorized("Invalid credentials.".to_string()),
            UserError::NotFound(id) => Self::user_not_found(id),
            UserError::SelfFollow => Self::ValidationError(err.to_string()),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<MessageError> for ApiError {
    fn from(err: MessageError) -> Self {
        match err {
            MessageError::NotFound(id) => Self::message_not_found(id),
            MessageError::LikeNotFound { .. } => Self::NotFound(err.to_string()),
            MessageError::NotOwner { .. } => Self::Unauthorized(err.to_string()),
            MessageError::Validation(msg) => Self::ValidationError(msg),
            MessageError::Database(msg) => Self::DatabaseError(msg),
            MessageError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        Self::NotFound(format!("{resource} {id} not found"))
    }

    #[must_use]
    pub fn user_not_found(id: i32) -> Self {
        Self::not_found("User", id)
    }

    #[must_use]
    pub fn message_not_found(id: i32) -> Self {
        Self::not_found("Message", id)
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::InternalError(msg.into())
    }
}
