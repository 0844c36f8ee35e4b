//! API error type with IntoResponse
//!
//! Errors are converted to `{"success": false, "error", "message"}` bodies
//! with matching status codes. Database details are logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fleetctl_core::{LifecycleError, ValidationError};
use serde_json::json;

use crate::db::DbError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Request could not be decoded (400)
    BadRequest { message: String },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Uniqueness, reference or state conflict (409)
    Conflict { message: String },

    /// Order status edge not allowed (409)
    InvalidTransition(LifecycleError),

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500, logged)
    Internal { message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } | Self::InvalidTransition(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => "validation_error",
            Self::NotFound { .. } => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::InvalidTransition(_) => "invalid_transition",
            Self::Database(_) | Self::Internal { .. } => "internal_error",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::BadRequest { message } | Self::Conflict { message } => message.clone(),
            Self::NotFound { resource, id } => format!("{resource} '{id}' not found"),
            Self::InvalidTransition(e) => e.to_string(),
            Self::Database(e) => {
                tracing::error!(error = %e, "database error");
                "an internal error occurred".into()
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                "an internal error occurred".into()
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({
            "success": false,
            "error": self.code(),
            "message": self.message(),
        });

        (self.status(), Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict(message) => Self::Conflict { message },
            DbError::Validation(e) => Self::Validation(e),
            DbError::Lifecycle(e @ LifecycleError::InvalidTransition { .. }) => {
                Self::InvalidTransition(e)
            }
            DbError::Lifecycle(e @ LifecycleError::Locked { .. }) => Self::Conflict {
                message: e.to_string(),
            },
            e @ (DbError::Sqlx(_) | DbError::Corrupt { .. }) => Self::Database(e),
        }
    }
}
