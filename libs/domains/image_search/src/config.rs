use core_config::{ConfigError, FromEnv};
use std::sync::Arc;

use crate::error::ImageSearchResult;
use crate::providers::{
    AzureOpenAiChatProvider, AzureSearchIndex, BlobSasSigner, ChatConfig, ReqwestFetcher,
    SasConfig, SearchIndexConfig, VisionConfig, VisionEmbeddingProvider,
};
use crate::resilience::DownstreamConfig;
use crate::service::ImageSearchService;

/// Everything needed to talk to the downstream services
#[derive(Debug, Clone)]
pub struct ImageSearchConfig {
    pub vision: VisionConfig,
    pub chat: ChatConfig,
    pub search: SearchIndexConfig,
    pub sas: SasConfig,
    pub downstream: DownstreamConfig,
}

impl FromEnv for ImageSearchConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            vision: VisionConfig::from_env()?,
            chat: ChatConfig::from_env()?,
            search: SearchIndexConfig::from_env()?,
            sas: SasConfig::from_env()?,
            downstream: DownstreamConfig::from_env()?,
        })
    }
}

impl ImageSearchService {
    /// Wire the Azure-backed providers described by `config`.
    pub fn from_config(config: ImageSearchConfig) -> ImageSearchResult<Self> {
        let downstream = &config.downstream;

        let embeddings = VisionEmbeddingProvider::new(config.vision, downstream)?;
        let chat = AzureOpenAiChatProvider::new(config.chat, downstream)?;
        let vector_field = config.search.vector_field.clone();
        let index = AzureSearchIndex::new(config.search, downstream);
        let signer = BlobSasSigner::new(config.sas)?;
        let fetcher =
            ReqwestFetcher::new(downstream.timeout)?.with_max_bytes(downstream.max_asset_bytes);

        Ok(ImageSearchService::new(
            Arc::new(embeddings),
            Arc::new(chat),
            Arc::new(index),
            Arc::new(signer),
            Arc::new(fetcher),
        )
        .with_vector_field(vector_field)
        .with_asset_fetch_concurrency(downstream.asset_fetch_concurrency))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [(&str, Option<&str>); 9] = [
        ("AI_VISION_ENDPOINT", Some("https://vision.example.com")),
        ("AI_VISION_API_KEY", Some("vision-key")),
        ("AZURE_OPENAI_ENDPOINT", Some("https://oai.example.com")),
        ("AZURE_OPENAI_API_KEY", Some("oai-key")),
        ("OPEN_AI_MODEL", Some("gpt-4o")),
        ("AI_SEARCH_SERVICE_ENDPOINT", Some("https://s.search.windows.net")),
        ("AZURE_SEARCH_ADMIN_KEY", Some("search-key")),
        ("AI_SEARCH_INDEX_NAME", Some("images")),
        ("ACCOUNT_KEY", Some("dGVzdC1hY2NvdW50LWtleS0wMTIzNDU2Nzg5")),
    ];

    #[test]
    fn test_loads_and_builds_service() {
        temp_env::with_vars(REQUIRED, || {
            let config = ImageSearchConfig::from_env().unwrap();
            assert_eq!(config.search.index_name, "images");
            assert_eq!(config.sas.ttl.as_secs(), 3600);
            assert!(ImageSearchService::from_config(config).is_ok());
        });
    }

    #[test]
    fn test_debug_output_redacts_credentials() {
        temp_env::with_vars(REQUIRED, || {
            let config = ImageSearchConfig::from_env().unwrap();
            let debug = format!("{config:?}");
            for secret in ["vision-key", "oai-key", "search-key", "dGVzdC1hY2NvdW50"] {
                assert!(!debug.contains(secret), "{secret} leaked in {debug}");
            }
            assert!(debug.contains("https://vision.example.com"));
            assert!(debug.contains("images"));
        });
    }

    #[test]
    fn test_missing_variable_is_named() {
        temp_env::with_vars(REQUIRED, || {
            temp_env::with_var_unset("AI_SEARCH_INDEX_NAME", || {
                let err = ImageSearchConfig::from_env().unwrap_err();
                assert!(err.to_string().contains("AI_SEARCH_INDEX_NAME"));
            });
        });
    }
}
