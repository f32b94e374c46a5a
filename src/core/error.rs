//! Error type system for the recipe API
//!
//! This module provides:
//! - A single error enum shared by repositories, services and handlers
//! - HTTP status code mapping
//! - JSON error bodies carrying the request trace ID

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use uuid::Uuid;

tokio::task_local! {
    /// Trace ID of the request currently being served
    static REQUEST_TRACE_ID: String;
}

/// Run `future` with `trace_id` as the trace ID stamped on any error body it produces
pub async fn with_trace_id<F: Future>(trace_id: String, future: F) -> F::Output {
    REQUEST_TRACE_ID.scope(trace_id, future).await
}

/// The current request's trace ID, or a fresh one outside a request
pub fn current_trace_id() -> String {
    REQUEST_TRACE_ID
        .try_with(Clone::clone)
        .unwrap_or_else(|_| Uuid::new_v4().to_string())
}

/// Main error type for the recipe API
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // System-level errors
    #[error("System initialization failed: {0}")]
    InitializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    // Request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid value for '{field}': {message}")]
    InvalidField { field: String, message: String },

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // I/O errors
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task error: {0}")]
    TaskError(String),
}

impl ApiError {
    /// Shorthand for a single-field validation failure
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError::InvalidField {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) | ApiError::InvalidField { .. } => {
                StatusCode::BAD_REQUEST
            }

            ApiError::AuthenticationError(_) => StatusCode::UNAUTHORIZED,

            ApiError::NotFound(_) => StatusCode::NOT_FOUND,

            ApiError::InitializationError(_)
            | ApiError::ConfigError(_)
            | ApiError::DatabaseError(_)
            | ApiError::IoError(_)
            | ApiError::TaskError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error type name for API responses
    pub fn error_type(&self) -> &'static str {
        match self {
            ApiError::InitializationError(_) => "InitializationError",
            ApiError::ConfigError(_) => "ConfigError",
            ApiError::DatabaseError(_) => "DatabaseError",
            ApiError::InvalidRequest(_) => "InvalidRequest",
            ApiError::InvalidField { .. } => "ValidationError",
            ApiError::AuthenticationError(_) => "AuthenticationError",
            ApiError::NotFound(_) => "NotFound",
            ApiError::IoError(_) => "IoError",
            ApiError::TaskError(_) => "TaskError",
        }
    }

    /// Field-level details in the `{field: [message]}` shape clients expect
    fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::InvalidField { field, message } => {
                Some(serde_json::json!({ field.as_str(): [message] }))
            }
            _ => None,
        }
    }
}

/// Error response structure for API endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error type identifier
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional per-field details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    /// Unique trace ID for this error
    pub trace_id: String,
}

impl ErrorResponse {
    /// Create a new error response tagged with the current request's trace ID
    pub fn new(error: String, message: String) -> Self {
        Self {
            error,
            message,
            details: None,
            trace_id: current_trace_id(),
        }
    }

    /// Create an error response from an ApiError
    pub fn from_error(error: &ApiError) -> Self {
        Self {
            details: error.details(),
            ..Self::new(error.error_type().to_string(), error.to_string())
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (trace_id: {})",
            self.error, self.message, self.trace_id
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        let error_response = ErrorResponse::from_error(&self);

        if status_code.is_server_error() {
            tracing::error!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request failed: {}",
                self
            );
        } else {
            tracing::warn!(
                error_type = self.error_type(),
                trace_id = %error_response.trace_id,
                status_code = %status_code,
                "Request rejected: {}",
                self
            );
        }

        (status_code, Json(error_response)).into_response()
    }
}

/// Result type alias for operations that can fail with ApiError
pub type Result<T> = std::result::Result<T, ApiError>;

/// Context extension trait for turning foreign errors into startup failures
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::fmt::Display,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| ApiError::InitializationError(format!("{}: {}", context.into(), e)))
    }
}
