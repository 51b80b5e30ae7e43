pub mod codes;
pub mod handlers;
pub mod responses;

pub use codes::ErrorCode;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Standard error response structure.
///
/// Returned for every error response:
/// - `code`: Integer error code for logging/monitoring (e.g., 6001)
/// - `error`: Machine-readable error identifier (e.g., "UPSTREAM_ERROR")
/// - `message`: Human-readable error message, never empty
/// - `details`: Optional additional error details
///
/// # JSON Example
///
/// ```json
/// {
///   "code": 1001,
///   "error": "VALIDATION_ERROR",
///   "message": "max_images must be a positive integer",
///   "details": null
/// }
/// ```
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Integer error code for logging and monitoring
    pub code: i32,
    /// Machine-readable error identifier for programmatic handling
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional structured error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Application error type that can be converted to HTTP responses.
///
/// Errors are classified by origin: client input (4xx), downstream
/// dependencies (502/504) and the server itself (500).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Unreadable request body: {0}")]
    BodyRejected(String),

    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Bad Gateway: {0}")]
    BadGateway(String),

    #[error("Gateway Timeout: {0}")]
    GatewayTimeout(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
}

impl AppError {
    /// HTTP status this error renders with.
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidJson(_) | AppError::BodyRejected(_) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Configuration(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Error code this error renders with.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            AppError::InvalidJson(_) => ErrorCode::InvalidJson,
            AppError::BodyRejected(_) => ErrorCode::JsonExtraction,
            AppError::BadRequest(_) => ErrorCode::ValidationError,
            AppError::BadGateway(_) => ErrorCode::UpstreamError,
            AppError::GatewayTimeout(_) => ErrorCode::UpstreamTimeout,
            AppError::Configuration(_) => ErrorCode::ConfigError,
            AppError::InternalServerError(_) => ErrorCode::InternalError,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.error_code();

        let message = match self {
            AppError::InvalidJson(msg) | AppError::BodyRejected(msg) => {
                tracing::info!(error_code = code.code(), "Rejected request body: {}", msg);
                msg
            }
            AppError::BadRequest(msg) => {
                tracing::info!(error_code = code.code(), "Bad request: {}", msg);
                msg
            }
            AppError::BadGateway(msg) => {
                tracing::error!(error_code = code.code(), "Downstream failure: {}", msg);
                msg
            }
            AppError::GatewayTimeout(msg) => {
                tracing::error!(error_code = code.code(), "Downstream timeout: {}", msg);
                msg
            }
            AppError::Configuration(msg) => {
                tracing::error!(error_code = code.code(), "Configuration error: {}", msg);
                msg
            }
            AppError::InternalServerError(msg) => {
                tracing::error!(error_code = code.code(), "Internal server error: {}", msg);
                msg
            }
        };

        // Clients rely on a non-empty message
        let message = if message.trim().is_empty() {
            code.default_message().to_string()
        } else {
            message
        };

        error_response(status, message, code)
    }
}

/// Helper function to create error responses.
///
/// # Example
///
/// ```rust,ignore
/// use axum_helpers::errors::{error_response, ErrorCode};
/// use axum::http::StatusCode;
///
/// let response = error_response(
///     StatusCode::BAD_REQUEST,
///     "Invalid input".to_string(),
///     ErrorCode::ValidationError,
/// );
/// ```
pub fn error_response(status: StatusCode, message: String, error_code: ErrorCode) -> Response {
    let body = Json(ErrorResponse {
        code: error_code.code(),
        error: error_code.as_str().to_string(),
        message,
        details: None,
    });

    (status, body).into_response()
}
