use crate::db::errors::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Record is held by another user or is otherwise in a state that
    /// forbids the requested transition
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// No available records remain after exhausting assignment retries
    #[error("No SIP lines available in the pool")]
    PoolExhausted,

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::PoolExhausted => StatusCode::SERVICE_UNAVAILABLE,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::AssignmentConflict { .. } => StatusCode::CONFLICT,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable code carried in the response envelope
    pub fn code(&self) -> &'static str {
        match self {
            Error::BadRequest { .. } => "VALIDATION_ERROR",
            Error::NotFound { .. } => "NOT_FOUND",
            Error::Conflict { .. } => "CONFLICT",
            Error::PoolExhausted => "POOL_EXHAUSTED",
            Error::Internal { .. } => "INTERNAL",
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "NOT_FOUND",
                DbError::AssignmentConflict { .. } => "CONFLICT",
                DbError::UniqueViolation { .. } => "CONFLICT",
                DbError::CheckViolation { .. } => "VALIDATION_ERROR",
                DbError::Other(_) => "INTERNAL",
            },
            Error::Other(_) => "INTERNAL",
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => {
                format!("{resource} with ID {id} not found")
            }
            Error::Conflict { message } => message.clone(),
            Error::PoolExhausted => "No SIP lines available in the pool".to_string(),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::AssignmentConflict { .. } => "SIP config was assigned or released concurrently".to_string(),
                DbError::UniqueViolation { constraint, .. } => match constraint.as_deref() {
                    Some("sip_configs_username_domain_unique") => {
                        "A SIP config with this username and domain already exists".to_string()
                    }
                    _ => "Resource already exists".to_string(),
                },
                DbError::CheckViolation { constraint, .. } => match constraint.as_deref() {
                    Some("sip_configs_port_range") => "Port must be between 1 and 65535".to_string(),
                    _ => "Invalid data provided".to_string(),
                },
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) | Error::Conflict { .. } => {
                tracing::warn!("Conflict error: {}", self);
            }
            Error::PoolExhausted => {
                tracing::warn!("Pool exhausted: {}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();

        // Uniform response envelope on every failure path
        let body = json!({
            "success": false,
            "error": self.user_message(),
            "code": self.code(),
        });

        (status, axum::response::Json(body)).into_response()
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
