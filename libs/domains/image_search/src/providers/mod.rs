//! Downstream capabilities used by the search pipeline.
//!
//! Each trait has one Azure-backed implementation in this module; tests swap
//! them for mocks or in-process fakes.

mod azure_openai;
mod azure_search;
mod blob_sas;
mod fetcher;
mod vision;

pub use azure_openai::{AzureOpenAiChatProvider, ChatConfig};
pub use azure_search::{AzureSearchIndex, SearchIndexConfig};
pub use blob_sas::{BlobLocation, BlobSasSigner, SasConfig};
pub use fetcher::ReqwestFetcher;
pub use vision::{VisionConfig, VisionEmbeddingProvider};

use async_trait::async_trait;

use crate::error::ImageSearchResult;
use crate::models::{FetchedAsset, IndexHit, VectorQuery};

/// Produces embeddings for text and images in a shared vector space.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed_text(&self, text: &str) -> ImageSearchResult<Vec<f32>>;

    /// `url` must be readable by the provider, typically a SAS-signed blob URL.
    async fn embed_image(&self, url: &str) -> ImageSearchResult<Vec<f32>>;

    /// Cheap call proving the provider is reachable with our credentials.
    async fn health_check(&self) -> ImageSearchResult<()>;
}

/// Rewrites a user query into a search-friendly one.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatCompletionProvider: Send + Sync {
    async fn complete(&self, text: &str) -> ImageSearchResult<String>;
}

/// Vector similarity search over the image index.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IndexService: Send + Sync {
    async fn search(&self, query: VectorQuery) -> ImageSearchResult<Vec<IndexHit>>;
}

/// Issues short-lived read tokens for stored assets.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssetAuthProvider: Send + Sync {
    /// Returns a query string (without the leading `?`) granting read access to `resource_url`.
    async fn issue_read_token(&self, resource_url: &str) -> ImageSearchResult<String>;
}

/// Plain HTTP GET for asset bytes.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// `authorization` is forwarded verbatim as the `Authorization` header.
    async fn get(&self, url: &str, authorization: Option<&str>) -> ImageSearchResult<FetchedAsset>;
}
