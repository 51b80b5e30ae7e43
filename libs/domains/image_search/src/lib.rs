//! Image Search Domain Library
//!
//! Natural language image search and image embedding over Azure services.
//!
//! # Architecture
//!
//! ```text
//!                  ┌────────────────────┐
//!                  │ ImageSearchService │  ← vectorize, search, blob events
//!                  └─────────┬──────────┘
//!      ┌──────────────┬──────┴───────┬───────────────┬──────────────┐
//! ┌────▼──────┐ ┌─────▼──────┐ ┌─────▼──────┐ ┌──────▼───────┐ ┌────▼──────┐
//! │ Embedding │ │    Chat    │ │   Index    │ │  AssetAuth   │ │   Http    │
//! │ Provider  │ │ Completion │ │  Service   │ │  Provider    │ │  Fetcher  │
//! └────┬──────┘ └─────┬──────┘ └─────┬──────┘ └──────┬───────┘ └────┬──────┘
//! ┌────▼──────┐ ┌─────▼──────┐ ┌─────▼──────┐ ┌──────▼───────┐ ┌────▼──────┐
//! │ AI Vision │ │   Azure    │ │ AI Search  │ │ Blob service │ │  reqwest  │
//! │ retrieval │ │   OpenAI   │ │  (lazy)    │ │     SAS      │ │    GET    │
//! └───────────┘ └────────────┘ └────────────┘ └──────────────┘ └───────────┘
//! ```
//!
//! Every HTTP-backed provider shares the same timeout and transient-retry
//! policy from [`resilience`].
//!
//! # Usage
//!
//! ```rust,no_run
//! use core_config::FromEnv;
//! use domain_image_search::{ImageSearchConfig, ImageSearchService, handlers};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ImageSearchConfig::from_env()?;
//! let service = ImageSearchService::from_config(config)?;
//! let routes = handlers::router(service);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod providers;
pub mod resilience;
pub mod service;

// Re-export commonly used types
pub use config::ImageSearchConfig;
pub use error::{ImageSearchError, ImageSearchResult};
pub use handlers::ImageSearchApiDoc;
pub use models::{
    EventGridEvent, EventOutcome, FetchedAsset, IndexHit, SearchRequest, SearchResult,
    SkillOutput, VectorQuery, VectorizeRequest, VectorizeResponse,
};
pub use providers::{
    AssetAuthProvider, ChatCompletionProvider, EmbeddingProvider, HttpFetcher, IndexService,
};
pub use resilience::{DownstreamConfig, RetryPolicy};
pub use service::ImageSearchService;
