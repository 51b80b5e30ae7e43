use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_required};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::error::{ImageSearchError, ImageSearchResult};
use crate::resilience::{DownstreamConfig, RetryPolicy, call_with_retry, ensure_success, http_client};

const SERVICE: &str = "vision";
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Azure AI Vision configuration
#[derive(Clone)]
pub struct VisionConfig {
    pub endpoint: String,
    pub api_key: String,
    pub api_version: String,
}

impl std::fmt::Debug for VisionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl VisionConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            api_version: "2023-02-01-preview".to_string(),
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }
}

impl FromEnv for VisionConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(
            env_required("AI_VISION_ENDPOINT")?,
            env_required("AI_VISION_API_KEY")?,
        )
        .with_api_version(env_or_default(
            "AI_VISION_API_VERSION",
            "2023-02-01-preview",
        )))
    }
}

/// Multimodal embeddings from the Azure AI Vision retrieval API
pub struct VisionEmbeddingProvider {
    client: Client,
    config: VisionConfig,
    retry: RetryPolicy,
}

impl VisionEmbeddingProvider {
    pub fn new(config: VisionConfig, downstream: &DownstreamConfig) -> ImageSearchResult<Self> {
        Ok(Self {
            client: http_client(downstream.timeout)?,
            config,
            retry: downstream.retry.clone(),
        })
    }

    fn url(&self, operation: &str) -> String {
        format!(
            "{}/computervision/{}?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            operation,
            self.config.api_version
        )
    }

    async fn vectorize(&self, operation: &str, body: VectorizeBody<'_>) -> ImageSearchResult<Vec<f32>> {
        let url = &self.url(operation);
        let body = &body;

        call_with_retry(SERVICE, &self.retry, || async move {
            let response = self
                .client
                .post(url)
                .header(SUBSCRIPTION_KEY_HEADER, &self.config.api_key)
                .json(body)
                .send()
                .await
                .map_err(|e| ImageSearchError::from_reqwest(SERVICE, e))?;

            let parsed: VectorResponse = ensure_success(SERVICE, response)
                .await?
                .json()
                .await
                .map_err(|e| ImageSearchError::from_reqwest(SERVICE, e))?;

            if parsed.vector.is_empty() {
                return Err(ImageSearchError::UnexpectedPayload {
                    service: SERVICE,
                    message: "empty vector".to_string(),
                });
            }

            Ok(parsed.vector)
        })
        .await
    }

    /// Lists the vision models available to this key.
    pub async fn list_models(&self) -> ImageSearchResult<Vec<String>> {
        let url = &self.url("models");

        call_with_retry(SERVICE, &self.retry, || async move {
            let response = self
                .client
                .get(url)
                .header(SUBSCRIPTION_KEY_HEADER, &self.config.api_key)
                .send()
                .await
                .map_err(|e| ImageSearchError::from_reqwest(SERVICE, e))?;

            let parsed: ModelsResponse = ensure_success(SERVICE, response)
                .await?
                .json()
                .await
                .map_err(|e| ImageSearchError::from_reqwest(SERVICE, e))?;

            Ok(parsed.value.into_iter().map(|m| m.name).collect())
        })
        .await
    }
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum VectorizeBody<'a> {
    Text { text: &'a str },
    Image { url: &'a str },
}

#[derive(Debug, Deserialize)]
struct VectorResponse {
    #[serde(default)]
    vector: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    #[serde(default)]
    value: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

#[async_trait]
impl EmbeddingProvider for VisionEmbeddingProvider {
    async fn embed_text(&self, text: &str) -> ImageSearchResult<Vec<f32>> {
        self.vectorize("retrieval:vectorizeText", VectorizeBody::Text { text })
            .await
    }

    async fn embed_image(&self, url: &str) -> ImageSearchResult<Vec<f32>> {
        self.vectorize("retrieval:vectorizeImage", VectorizeBody::Image { url })
            .await
    }

    async fn health_check(&self) -> ImageSearchResult<()> {
        self.list_models().await.map(|_| ())
    }
}
