use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

/// Number of search results returned when the caller does not ask for a count.
pub const DEFAULT_MAX_IMAGES: usize = 5;

// ===== Vectorize (custom skill contract) =====

/// Batch of records to embed, in the custom skill envelope.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "values": [
        {"recordId": "1", "data": {"imageUrl": "https://acct.blob.core.windows.net/images/car.jpg"}},
        {"recordId": "2", "data": {"text": "a red car"}}
    ]
}))]
pub struct VectorizeRequest {
    /// Opaque records. Each is parsed on its own so one bad record does not fail the batch.
    #[schema(value_type = Vec<Object>)]
    pub values: Vec<Value>,
}

/// Output records, positionally matching the request.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VectorizeResponse {
    pub values: Vec<SkillOutput>,
}

/// Input record parsed from one element of `values`.
#[derive(Debug, Clone, Deserialize)]
pub struct SkillInput {
    #[serde(rename = "recordId", default)]
    pub record_id: Value,
    #[serde(default)]
    pub data: SkillInputData,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SkillInputData {
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    pub text: Option<String>,
}

/// What a single record asks to embed.
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingInput {
    ImageUrl(String),
    Text(String),
}

impl SkillInputData {
    /// An image URL wins over text when both are present.
    pub fn embedding_input(&self) -> Option<EmbeddingInput> {
        match (&self.image_url, &self.text) {
            (Some(url), _) if !url.trim().is_empty() => Some(EmbeddingInput::ImageUrl(url.clone())),
            (_, Some(text)) if !text.trim().is_empty() => Some(EmbeddingInput::Text(text.clone())),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SkillOutputData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SkillMessage {
    pub message: String,
}

/// One output record. `errors` is set (and `data` empty) when the record failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SkillOutput {
    #[serde(rename = "recordId")]
    #[schema(value_type = Object)]
    pub record_id: Value,
    pub data: SkillOutputData,
    pub errors: Option<Vec<SkillMessage>>,
    pub warnings: Option<Vec<SkillMessage>>,
}

impl SkillOutput {
    pub fn vector(record_id: Value, vector: Vec<f32>) -> Self {
        Self {
            record_id,
            data: SkillOutputData {
                vector: Some(vector),
            },
            errors: None,
            warnings: None,
        }
    }

    pub fn failed(record_id: Value, message: impl Into<String>) -> Self {
        Self {
            record_id,
            data: SkillOutputData::default(),
            errors: Some(vec![SkillMessage {
                message: message.into(),
            }]),
            warnings: None,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }
}

// ===== Search =====

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"query": "red car", "max_images": 2}))]
pub struct SearchRequest {
    /// Free text query, rewritten by the chat model before embedding
    pub query: Option<String>,
    /// Upper bound on results, defaults to 5
    pub max_images: Option<i64>,
}

/// One ranked hit with its image inlined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchResult {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Image URL")]
    pub image_url: String,
    /// Base64 image bytes, or a failure description when the image could not be fetched
    #[serde(rename = "Image")]
    pub image: String,
    #[serde(rename = "Score")]
    pub score: f64,
}

/// Nearest-neighbour query sent to the index.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorQuery {
    pub vector: Vec<f32>,
    pub k: usize,
    pub fields: String,
}

/// A raw index hit, before the image is fetched.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub title: String,
    pub image_url: String,
    pub score: f64,
}

/// Response of an asset GET.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedAsset {
    pub status: u16,
    pub bytes: Vec<u8>,
}

// ===== Event Grid =====

pub const SUBSCRIPTION_VALIDATION_EVENT: &str = "Microsoft.EventGrid.SubscriptionValidationEvent";
pub const BLOB_CREATED_EVENT: &str = "Microsoft.Storage.BlobCreated";

/// Event Grid event in the Event Grid schema.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EventGridEvent {
    pub id: String,
    #[serde(rename = "eventType")]
    pub event_type: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: Value,
}

/// Webhook answer: a validation handshake or the vectorized blobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum EventOutcome {
    Validation {
        #[serde(rename = "validationResponse")]
        validation_response: String,
    },
    Processed {
        values: Vec<SkillOutput>,
    },
}
