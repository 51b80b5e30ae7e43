//! JSON body extractor that ignores `Content-Type`.

use crate::errors::AppError;
use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

/// JSON extractor that parses the raw body regardless of the request's
/// `Content-Type` header.
///
/// Every parse failure (empty body, syntax error, missing field, wrong type)
/// is a client error rendered as `400 INVALID_JSON` with serde's message.
///
/// # Example
/// ```ignore
/// use axum_helpers::extractors::JsonBody;
///
/// async fn create(JsonBody(payload): JsonBody<CreateThing>) -> String {
///     format!("Creating {}", payload.name)
/// }
/// ```
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BodyRejected(e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(AppError::InvalidJson("Request body is empty".to_string()));
        }

        serde_json::from_slice(&bytes)
            .map(JsonBody)
            .map_err(|e| AppError::InvalidJson(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Json, Router, body::Body, http::StatusCode, routing::post};
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize)]
    struct Payload {
        name: String,
    }

    fn app() -> Router {
        Router::new().route(
            "/",
            post(|JsonBody(p): JsonBody<Payload>| async move { Json(p.name) }),
        )
    }

    async fn post_body(body: &'static str, content_type: Option<&str>) -> (StatusCode, String) {
        let mut builder = axum::http::Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        let response = app()
            .oneshot(builder.body(Body::from(body)).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_parses_without_content_type() {
        let (status, body) = post_body(r#"{"name":"cat"}"#, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "\"cat\"");
    }

    #[tokio::test]
    async fn test_parses_with_text_content_type() {
        let (status, _) = post_body(r#"{"name":"cat"}"#, Some("text/plain")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let (status, body) = post_body("{not json", Some("application/json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("INVALID_JSON"));
    }

    #[tokio::test]
    async fn test_missing_field_is_bad_request() {
        let (status, body) = post_body("{}", Some("application/json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("name"));
    }

    #[tokio::test]
    async fn test_empty_body_is_bad_request() {
        let (status, body) = post_body("  ", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("empty"));
    }
}
