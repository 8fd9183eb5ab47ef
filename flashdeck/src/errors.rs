use crate::chat::{ChatError, ChatErrorKind};
use crate::db::errors::DbError;
use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Authentication required but not provided
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Malformed request, or a business rule the provider rejected
    #[error("{message}")]
    BadRequest { message: String },

    /// Request data failed validation
    #[error("{message}")]
    Validation { message: String, details: Option<Value> },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// A required setting is missing; the message is safe to show
    #[error("{message}")]
    Misconfigured { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// A storage call failed while performing `operation`
    #[error("Failed to {operation}: {source}")]
    Storage {
        operation: String,
        #[source]
        source: DbError,
    },

    /// Chat completion provider error
    #[error(transparent)]
    Upstream(#[from] ChatError),
}

impl Error {
    /// `map_err` helper: `store.create(..).await.map_err(Error::storage("create flashcard"))`
    pub fn storage(operation: &str) -> impl FnOnce(DbError) -> Error + '_ {
        move |source| Error::Storage {
            operation: operation.to_string(),
            source,
        }
    }

    /// 422 "Validation failed." with a list of field problems
    pub fn validation(problems: Vec<String>) -> Self {
        Error::Validation {
            message: "Validation failed.".to_string(),
            details: Some(json!(problems)),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Misconfigured { .. } | Error::Internal { .. } | Error::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Upstream(chat_err) => match chat_err.kind {
                ChatErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
                // An error never goes out with a success status
                _ => chat_err
                    .status
                    .and_then(|s| StatusCode::from_u16(s).ok())
                    .filter(|s| !s.is_success())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
            },
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Unauthorized.".to_string()),
            Error::BadRequest { message } | Error::Validation { message, .. } | Error::Misconfigured { message } => message.clone(),
            Error::NotFound { resource, .. } => format!("{resource} not found."),
            Error::Internal { .. } => "Internal server error.".to_string(),
            Error::Storage { operation, .. } => format!("Failed to {operation}."),
            Error::Upstream(chat_err) => chat_err.message.clone(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Misconfigured { .. } | Error::Internal { .. } | Error::Storage { .. } => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Upstream(chat_err) => {
                tracing::warn!(status = ?chat_err.status, code = ?chat_err.code, "Upstream error: {}", self);
            }
            Error::Unauthenticated { .. } => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::BadRequest { .. } | Error::Validation { .. } | Error::NotFound { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();

        let body = match &self {
            // Chat errors keep the provider's status, code and raw body
            Error::Upstream(chat_err) => json!({
                "message": chat_err.message,
                "status": chat_err.status,
                "code": chat_err.code,
                "details": chat_err.details,
            }),
            Error::Validation {
                message,
                details: Some(details),
            } => json!({ "message": message, "details": details }),
            _ => json!({ "message": self.user_message() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Syntax errors and a missing content type are "Invalid JSON payload."; a well-formed body of the
/// wrong shape is a validation failure.
impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => Error::Validation {
                message: "Validation failed.".to_string(),
                details: Some(json!([err.body_text()])),
            },
            _ => Error::BadRequest {
                message: "Invalid JSON payload.".to_string(),
            },
        }
    }
}

/// Query strings that cannot be decoded at all (e.g. a repeated key) fail validation
impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::Validation {
            message: "Validation failed.".to_string(),
            details: Some(json!([rejection.body_text()])),
        }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
