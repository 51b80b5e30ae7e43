use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use observability::DownstreamMetrics;
use observability::downstream::{OUTCOME_ERROR, OUTCOME_OK, OUTCOME_TIMEOUT};
use reqwest::Client;
use std::time::{Duration, Instant};

use super::HttpFetcher;
use crate::error::{ImageSearchError, ImageSearchResult};
use crate::models::FetchedAsset;
use crate::resilience::{DEFAULT_MAX_ASSET_BYTES, http_client};

const SERVICE: &str = "blob";

/// Single-attempt GET. Non-2xx statuses are returned, not raised.
///
/// Bodies larger than `max_bytes` are rejected before they are fully buffered.
pub struct ReqwestFetcher {
    client: Client,
    max_bytes: usize,
}

impl ReqwestFetcher {
    pub fn new(timeout: Duration) -> ImageSearchResult<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            max_bytes: DEFAULT_MAX_ASSET_BYTES,
        })
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    fn too_large(&self) -> ImageSearchError {
        ImageSearchError::UnexpectedPayload {
            service: SERVICE,
            message: format!("asset is larger than {} bytes", self.max_bytes),
        }
    }

    async fn fetch(&self, url: &str, authorization: Option<&str>) -> ImageSearchResult<FetchedAsset> {
        let mut request = self.client.get(url);
        if let Some(value) = authorization {
            request = request.header(AUTHORIZATION, value);
        }

        let mut response = request
            .send()
            .await
            .map_err(|e| ImageSearchError::from_reqwest(SERVICE, e))?;
        let status = response.status().as_u16();

        if response
            .content_length()
            .is_some_and(|length| length > self.max_bytes as u64)
        {
            return Err(self.too_large());
        }

        // Content-Length may be absent or wrong
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ImageSearchError::from_reqwest(SERVICE, e))?
        {
            if bytes.len() + chunk.len() > self.max_bytes {
                return Err(self.too_large());
            }
            bytes.extend_from_slice(&chunk);
        }

        Ok(FetchedAsset { status, bytes })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &str, authorization: Option<&str>) -> ImageSearchResult<FetchedAsset> {
        let started = Instant::now();
        let result = self.fetch(url, authorization).await;

        let outcome = match &result {
            Ok(asset) if asset.status == 200 => OUTCOME_OK,
            Err(ImageSearchError::Timeout { .. }) => OUTCOME_TIMEOUT,
            _ => OUTCOME_ERROR,
        };
        DownstreamMetrics::record_call(SERVICE, outcome, started.elapsed());

        result
    }
}
