use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_required};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::info;

use super::IndexService;
use crate::error::{ImageSearchError, ImageSearchResult};
use crate::models::{IndexHit, VectorQuery};
use crate::resilience::{DownstreamConfig, RetryPolicy, call_with_retry, ensure_success, http_client};

const SERVICE: &str = "search";
const SELECT_FIELDS: &str = "title,imageUrl";

/// Azure AI Search index configuration
#[derive(Clone)]
pub struct SearchIndexConfig {
    pub endpoint: String,
    pub api_key: String,
    pub index_name: String,
    pub api_version: String,
    /// Index field holding the image embeddings
    pub vector_field: String,
}

impl std::fmt::Debug for SearchIndexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchIndexConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("index_name", &self.index_name)
            .field("api_version", &self.api_version)
            .field("vector_field", &self.vector_field)
            .finish()
    }
}

impl FromEnv for SearchIndexConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: env_required("AI_SEARCH_SERVICE_ENDPOINT")?,
            api_key: env_required("AZURE_SEARCH_ADMIN_KEY")?,
            index_name: env_required("AI_SEARCH_INDEX_NAME")?,
            api_version: env_or_default("AI_SEARCH_API_VERSION", "2023-11-01"),
            vector_field: env_or_default("AI_SEARCH_VECTOR_FIELD", "imageVector"),
        })
    }
}

/// Vector queries against an Azure AI Search index.
///
/// The HTTP client is created on first use and shared by all later requests.
pub struct AzureSearchIndex {
    config: SearchIndexConfig,
    timeout: Duration,
    retry: RetryPolicy,
    client: OnceCell<Client>,
}

impl AzureSearchIndex {
    pub fn new(config: SearchIndexConfig, downstream: &DownstreamConfig) -> Self {
        Self {
            config,
            timeout: downstream.timeout,
            retry: downstream.retry.clone(),
            client: OnceCell::new(),
        }
    }

    async fn client(&self) -> ImageSearchResult<&Client> {
        self.client
            .get_or_try_init(|| async {
                info!(index = %self.config.index_name, "Creating search index client");
                http_client(self.timeout)
            })
            .await
    }

    fn url(&self) -> String {
        format!(
            "{}/indexes/{}/docs/search?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.index_name,
            self.config.api_version
        )
    }
}

#[derive(Debug, Serialize)]
struct SearchBody<'a> {
    #[serde(rename = "vectorQueries")]
    vector_queries: [VectorQueryBody<'a>; 1],
    select: &'static str,
    top: usize,
}

#[derive(Debug, Serialize)]
struct VectorQueryBody<'a> {
    kind: &'static str,
    vector: &'a [f32],
    k: usize,
    fields: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    value: Vec<SearchDocument>,
}

#[derive(Debug, Deserialize)]
struct SearchDocument {
    #[serde(rename = "@search.score")]
    score: f64,
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "imageUrl", default)]
    image_url: Option<String>,
}

#[async_trait]
impl IndexService for AzureSearchIndex {
    async fn search(&self, query: VectorQuery) -> ImageSearchResult<Vec<IndexHit>> {
        let client = self.client().await?;
        let url = &self.url();
        let body = &SearchBody {
            vector_queries: [VectorQueryBody {
                kind: "vector",
                vector: &query.vector,
                k: query.k,
                fields: &query.fields,
            }],
            select: SELECT_FIELDS,
            top: query.k,
        };

        call_with_retry(SERVICE, &self.retry, || async move {
            let response = client
                .post(url)
                .header("api-key", &self.config.api_key)
                .json(body)
                .send()
                .await
                .map_err(|e| ImageSearchError::from_reqwest(SERVICE, e))?;

            let parsed: SearchResponse = ensure_success(SERVICE, response)
                .await?
                .json()
                .await
                .map_err(|e| ImageSearchError::from_reqwest(SERVICE, e))?;

            Ok(parsed
                .value
                .into_iter()
                .map(|doc| IndexHit {
                    title: doc.title.unwrap_or_default(),
                    image_url: doc.image_url.unwrap_or_default(),
                    score: doc.score,
                })
                .collect())
        })
        .await
    }
}
