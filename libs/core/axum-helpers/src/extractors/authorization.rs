//! Extractor for the caller's `Authorization` header.

use crate::errors::AppError;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

/// The inbound `Authorization` header, kept verbatim so it can be forwarded
/// to downstream calls. It is neither validated nor parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardedAuthorization(pub Option<String>);

impl ForwardedAuthorization {
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S> FromRequestParts<S> for ForwardedAuthorization
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.headers.get(AUTHORIZATION) {
            None => Ok(Self(None)),
            Some(value) => value
                .to_str()
                .map(|v| Self(Some(v.to_string())))
                .map_err(|_| {
                    AppError::BadRequest("Authorization header must be visible ASCII".to_string())
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<ForwardedAuthorization, AppError> {
        let (mut parts, _) = request.into_parts();
        ForwardedAuthorization::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_header_is_forwarded_verbatim() {
        let request = Request::builder()
            .header("Authorization", "Bearer abc.def")
            .body(())
            .unwrap();
        let auth = extract(request).await.unwrap();
        assert_eq!(auth.as_deref(), Some("Bearer abc.def"));
    }

    #[tokio::test]
    async fn test_missing_header_is_none() {
        let auth = extract(Request::new(())).await.unwrap();
        assert_eq!(auth, ForwardedAuthorization(None));
    }
}
