//! Response envelopes and error mapping.
//!
//! # Responsibilities
//! - Wrap successful payloads as `{success, message, data}`
//! - Map subsystem errors to status codes and `{error, message}` bodies
//!
//! # Design Decisions
//! - Storage faults are logged here and never leak details to clients
//! - Tracking failures never reach this layer as errors

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domains::DomainError;
use crate::lookup::LookupError;
use crate::referrer::BlocklistError;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

/// Successful JSON response with the standard envelope.
pub fn success<T: Serialize>(status: StatusCode, message: impl Into<String>, data: T) -> Response {
    let body = Envelope {
        success: true,
        message: message.into(),
        data,
    };
    (status, Json(body)).into_response()
}

/// Error returned from handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, error: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error,
            message: message.into(),
        }
    }

    pub fn bad_request(error: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, error, message)
    }

    pub fn not_found(error: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, error, message)
    }

    fn internal(error: &'static str, message: &'static str) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, error, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error,
            message: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request("Invalid request body", rejection.body_text())
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Invalid(msg) => ApiError::bad_request("Missing required fields", msg),
            DomainError::UnknownDomain(_) | DomainError::UnknownId(_) => {
                ApiError::not_found("Domain not found", err.to_string())
            }
            DomainError::Conflict(_) => {
                ApiError::new(StatusCode::CONFLICT, "Domain already exists", err.to_string())
            }
            DomainError::Storage(e) => {
                tracing::error!(error = %e, "Database error");
                ApiError::internal("Database error", "Failed to access domain information")
            }
        }
    }
}

impl From<LookupError> for ApiError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::Validation(msg) => ApiError::bad_request("Missing required field", msg),
            LookupError::NotFound(_) => ApiError::not_found("Domain not found", err.to_string()),
            LookupError::Storage(e) => {
                tracing::error!(error = %e, "Database error during lookup");
                ApiError::internal("Database error", "Failed to search domain")
            }
        }
    }
}

impl From<BlocklistError> for ApiError {
    fn from(err: BlocklistError) -> Self {
        match err {
            BlocklistError::Blank => ApiError::bad_request("Missing required field", err.to_string()),
            other => {
                tracing::error!(error = %other, "Spy domain list update failed");
                ApiError::internal("Internal server error", "Failed to update spy domains")
            }
        }
    }
}
