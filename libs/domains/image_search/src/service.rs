use base64::{Engine as _, engine::general_purpose::STANDARD};
use futures::stream::{self, StreamExt};
use observability::DownstreamMetrics;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::error::{ImageSearchError, ImageSearchResult};
use crate::models::{
    BLOB_CREATED_EVENT, DEFAULT_MAX_IMAGES, EmbeddingInput, EventGridEvent, EventOutcome,
    IndexHit, SUBSCRIPTION_VALIDATION_EVENT, SearchRequest, SearchResult, SkillInput, SkillOutput,
    VectorQuery,
};
use crate::providers::{
    AssetAuthProvider, ChatCompletionProvider, EmbeddingProvider, HttpFetcher, IndexService,
};

const DEFAULT_VECTOR_FIELD: &str = "imageVector";
const DEFAULT_ASSET_FETCH_CONCURRENCY: usize = 4;

/// Instruction wrapped around the user query before it is sent to the chat model.
pub fn rewrite_prompt(query: &str) -> String {
    format!(
        "Convert a user query into a textual representation capturing central semantic meanings \
         which is most suitable for finding best results in a search. Output only a final query \
         not more tha 200 tokens size. Here is the original query: {}",
        query
    )
}

/// Image search service
///
/// Orchestrates query rewriting, embedding, vector search and asset retrieval
/// over the injected providers. Holds no per-request state.
pub struct ImageSearchService {
    embeddings: Arc<dyn EmbeddingProvider>,
    chat: Arc<dyn ChatCompletionProvider>,
    index: Arc<dyn IndexService>,
    asset_auth: Arc<dyn AssetAuthProvider>,
    fetcher: Arc<dyn HttpFetcher>,
    vector_field: String,
    asset_fetch_concurrency: usize,
}

impl ImageSearchService {
    pub fn new(
        embeddings: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatCompletionProvider>,
        index: Arc<dyn IndexService>,
        asset_auth: Arc<dyn AssetAuthProvider>,
        fetcher: Arc<dyn HttpFetcher>,
    ) -> Self {
        Self {
            embeddings,
            chat,
            index,
            asset_auth,
            fetcher,
            vector_field: DEFAULT_VECTOR_FIELD.to_string(),
            asset_fetch_concurrency: DEFAULT_ASSET_FETCH_CONCURRENCY,
        }
    }

    pub fn with_vector_field(mut self, vector_field: impl Into<String>) -> Self {
        self.vector_field = vector_field.into();
        self
    }

    pub fn with_asset_fetch_concurrency(mut self, concurrency: usize) -> Self {
        self.asset_fetch_concurrency = concurrency.max(1);
        self
    }

    // ===== Vectorize =====

    /// Embed every record, returning one output per input in the same order.
    ///
    /// A record that cannot be embedded yields an output carrying `errors`
    /// instead of failing the batch.
    #[instrument(skip(self, values), fields(count = values.len()))]
    pub async fn vectorize(&self, values: Vec<Value>) -> Vec<SkillOutput> {
        stream::iter(values)
            .map(|value| self.vectorize_value(value))
            .buffered(self.asset_fetch_concurrency)
            .collect()
            .await
    }

    async fn vectorize_value(&self, value: Value) -> SkillOutput {
        let record_id = value.get("recordId").cloned().unwrap_or(Value::Null);

        match serde_json::from_value::<SkillInput>(value) {
            Ok(input) => {
                self.vectorize_record(input.record_id, input.data.embedding_input())
                    .await
            }
            Err(e) => {
                warn!(record_id = %record_id, "Unreadable vectorize record: {}", e);
                SkillOutput::failed(record_id, format!("Invalid record: {}", e))
            }
        }
    }

    async fn vectorize_record(&self, record_id: Value, input: Option<EmbeddingInput>) -> SkillOutput {
        match self.embed(input).await {
            Ok(vector) => SkillOutput::vector(record_id, vector),
            Err(e) => {
                warn!(record_id = %record_id, "Failed to vectorize record: {}", e);
                SkillOutput::failed(record_id, e.to_string())
            }
        }
    }

    async fn embed(&self, input: Option<EmbeddingInput>) -> ImageSearchResult<Vec<f32>> {
        match input {
            Some(EmbeddingInput::ImageUrl(url)) => {
                let token = self.asset_auth.issue_read_token(&url).await?;
                self.embeddings
                    .embed_image(&format!("{}?{}", url, token))
                    .await
            }
            Some(EmbeddingInput::Text(text)) => self.embeddings.embed_text(&text).await,
            None => Err(ImageSearchError::Validation(
                "Record has neither data.imageUrl nor data.text".to_string(),
            )),
        }
    }

    // ===== Search =====

    /// Rewrite, embed and search, then inline each hit's image.
    ///
    /// Any failure before the hits are known fails the request. Per-hit
    /// failures only replace that hit's `Image` with a failure message.
    #[instrument(skip(self, request, authorization))]
    pub async fn search(
        &self,
        request: SearchRequest,
        authorization: Option<&str>,
    ) -> ImageSearchResult<Vec<SearchResult>> {
        let (query, max_images) = validate_search(request)?;

        let rewritten = self.chat.complete(&rewrite_prompt(&query)).await?;
        info!(original = %query, rewritten = %rewritten, "Rewrote search query");

        let vector = self.embeddings.embed_text(&rewritten).await?;

        let mut hits = self
            .index
            .search(VectorQuery {
                vector,
                k: max_images,
                fields: self.vector_field.clone(),
            })
            .await?;
        debug!(hits = hits.len(), "Index returned hits");

        // Stable, so equal scores keep the index order
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(max_images);

        let results: Vec<SearchResult> = stream::iter(hits)
            .map(|hit| self.resolve_hit(hit, authorization))
            .buffered(self.asset_fetch_concurrency)
            .collect()
            .await;

        Ok(results)
    }

    async fn resolve_hit(&self, hit: IndexHit, authorization: Option<&str>) -> SearchResult {
        let image = match self.fetch_image(&hit.image_url, authorization).await {
            Ok(encoded) => encoded,
            Err(message) => {
                warn!(image_url = %hit.image_url, "{}", message);
                DownstreamMetrics::record_degraded_asset();
                message
            }
        };

        SearchResult {
            title: hit.title,
            image_url: hit.image_url,
            image,
            score: hit.score,
        }
    }

    /// Base64 image bytes, or the failure message to show in their place.
    async fn fetch_image(&self, image_url: &str, authorization: Option<&str>) -> Result<String, String> {
        let token = self
            .asset_auth
            .issue_read_token(image_url)
            .await
            .map_err(|e| format!("Failed to download image: {}", e))?;

        let asset = self
            .fetcher
            .get(&format!("{}?{}", image_url, token), authorization)
            .await
            .map_err(|e| format!("Failed to download image: {}", e))?;

        if asset.status != 200 {
            return Err(format!(
                "Failed to download image. Status code: {}",
                asset.status
            ));
        }

        Ok(STANDARD.encode(asset.bytes))
    }

    // ===== Events =====

    /// Handle an Event Grid delivery.
    ///
    /// A subscription validation handshake is answered on its own; otherwise
    /// every `BlobCreated` event is vectorized and other event types are skipped.
    #[instrument(skip(self, events), fields(count = events.len()))]
    pub async fn handle_blob_events(
        &self,
        events: Vec<EventGridEvent>,
    ) -> ImageSearchResult<EventOutcome> {
        if let Some(event) = events
            .iter()
            .find(|e| e.event_type == SUBSCRIPTION_VALIDATION_EVENT)
        {
            let code = event
                .data
                .get("validationCode")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ImageSearchError::Validation(
                        "Subscription validation event is missing data.validationCode".to_string(),
                    )
                })?;

            info!(event_id = %event.id, "Answering Event Grid subscription validation");
            return Ok(EventOutcome::Validation {
                validation_response: code.to_string(),
            });
        }

        let records: Vec<(Value, Option<EmbeddingInput>)> = events
            .into_iter()
            .filter_map(|event| {
                if event.event_type != BLOB_CREATED_EVENT {
                    debug!(event_id = %event.id, event_type = %event.event_type, "Skipping event");
                    return None;
                }
                let input = event
                    .data
                    .get("url")
                    .and_then(Value::as_str)
                    .map(|url| EmbeddingInput::ImageUrl(url.to_string()));
                Some((Value::String(event.id), input))
            })
            .collect();

        let values: Vec<SkillOutput> = stream::iter(records)
            .map(|(record_id, input)| self.vectorize_record(record_id, input))
            .buffered(self.asset_fetch_concurrency)
            .collect()
            .await;

        Ok(EventOutcome::Processed { values })
    }

    // ===== Readiness =====

    pub async fn check_readiness(&self) -> ImageSearchResult<()> {
        self.embeddings.health_check().await
    }
}

fn validate_search(request: SearchRequest) -> ImageSearchResult<(String, usize)> {
    let query = request
        .query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| {
            ImageSearchError::Validation("The 'query' parameter is required".to_string())
        })?;

    let max_images = match request.max_images {
        None => DEFAULT_MAX_IMAGES,
        Some(n) if n > 0 => usize::try_from(n).map_err(|_| {
            ImageSearchError::Validation("max_images must be a positive integer".to_string())
        })?,
        Some(_) => {
            return Err(ImageSearchError::Validation(
                "max_images must be a positive integer".to_string(),
            ));
        }
    };

    Ok((query, max_images))
}
