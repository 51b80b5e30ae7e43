use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use core_config::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageSearchError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Invalid blob URL: {0}")]
    InvalidBlobUrl(String),

    /// The downstream service answered with an error status or could not be reached.
    #[error("{service} request failed: {message}")]
    Upstream {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// The downstream service answered 2xx with a body we cannot use.
    #[error("{service} returned an unexpected payload: {message}")]
    UnexpectedPayload {
        service: &'static str,
        message: String,
    },

    #[error("{service} request timed out")]
    Timeout { service: &'static str },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ImageSearchResult<T> = Result<T, ImageSearchError>;

impl ImageSearchError {
    /// Classify a reqwest failure for `service`.
    pub fn from_reqwest(service: &'static str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ImageSearchError::Timeout { service }
        } else if err.is_decode() {
            ImageSearchError::UnexpectedPayload {
                service,
                message: err.to_string(),
            }
        } else {
            ImageSearchError::Upstream {
                service,
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }

    /// Whether repeating the call may succeed: timeouts, transport errors, 429 and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            ImageSearchError::Timeout { .. } => true,
            ImageSearchError::Upstream { status: None, .. } => true,
            ImageSearchError::Upstream {
                status: Some(status),
                ..
            } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<ConfigError> for ImageSearchError {
    fn from(err: ConfigError) -> Self {
        ImageSearchError::Config(err.to_string())
    }
}

/// Convert ImageSearchError to AppError for standardized HTTP error responses
impl From<ImageSearchError> for AppError {
    fn from(err: ImageSearchError) -> Self {
        match err {
            ImageSearchError::Validation(msg) => AppError::BadRequest(msg),
            ImageSearchError::InvalidJson(msg) => AppError::InvalidJson(msg),
            ImageSearchError::InvalidBlobUrl(url) => {
                AppError::BadRequest(format!("Invalid blob URL: {}", url))
            }
            err @ (ImageSearchError::Upstream { .. }
            | ImageSearchError::UnexpectedPayload { .. }) => AppError::BadGateway(err.to_string()),
            err @ ImageSearchError::Timeout { .. } => AppError::GatewayTimeout(err.to_string()),
            ImageSearchError::Config(msg) => AppError::Configuration(msg),
            ImageSearchError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for ImageSearchError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn upstream(status: Option<u16>) -> ImageSearchError {
        ImageSearchError::Upstream {
            service: "search",
            status,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(ImageSearchError::Timeout { service: "chat" }.is_transient());
        assert!(upstream(None).is_transient());
        assert!(upstream(Some(429)).is_transient());
        assert!(upstream(Some(503)).is_transient());
        assert!(!upstream(Some(401)).is_transient());
        assert!(!ImageSearchError::Validation("x".into()).is_transient());
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ImageSearchError::Validation("q".into()), StatusCode::BAD_REQUEST),
            (ImageSearchError::InvalidJson("q".into()), StatusCode::BAD_REQUEST),
            (upstream(Some(500)), StatusCode::BAD_GATEWAY),
            (
                ImageSearchError::UnexpectedPayload {
                    service: "vision",
                    message: "missing vector".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                ImageSearchError::Timeout { service: "vision" },
                StatusCode::GATEWAY_TIMEOUT,
            ),
            (
                ImageSearchError::Config("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ImageSearchError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_upstream_message_names_service() {
        let app: AppError = upstream(Some(503)).into();
        assert!(app.to_string().contains("search request failed"));
    }
}
