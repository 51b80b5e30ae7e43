use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_or_default, env_required};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::ChatCompletionProvider;
use crate::error::{ImageSearchError, ImageSearchResult};
use crate::resilience::{DownstreamConfig, RetryPolicy, call_with_retry, ensure_success, http_client};

const SERVICE: &str = "chat";
const SYSTEM_PROMPT: &str = "You are helpful assistant. ";
const MAX_TOKENS: u32 = 200;

/// Azure OpenAI deployment configuration
#[derive(Clone)]
pub struct ChatConfig {
    pub endpoint: String,
    pub api_key: String,
    /// Deployment name, used as the model
    pub deployment: String,
    pub api_version: String,
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("deployment", &self.deployment)
            .field("api_version", &self.api_version)
            .finish()
    }
}

impl FromEnv for ChatConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: env_required("AZURE_OPENAI_ENDPOINT")?,
            api_key: env_required("AZURE_OPENAI_API_KEY")?,
            deployment: env_required("OPEN_AI_MODEL")?,
            api_version: env_or_default("API_VERSION", "2024-02-01"),
        })
    }
}

/// Chat completions against an Azure OpenAI deployment
pub struct AzureOpenAiChatProvider {
    client: Client,
    config: ChatConfig,
    retry: RetryPolicy,
}

impl AzureOpenAiChatProvider {
    pub fn new(config: ChatConfig, downstream: &DownstreamConfig) -> ImageSearchResult<Self> {
        Ok(Self {
            client: http_client(downstream.timeout)?,
            config,
            retry: downstream.retry.clone(),
        })
    }

    fn url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment,
            self.config.api_version
        )
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl ChatCompletionProvider for AzureOpenAiChatProvider {
    async fn complete(&self, text: &str) -> ImageSearchResult<String> {
        let url = &self.url();
        let request = &ChatRequest {
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            max_tokens: MAX_TOKENS,
        };

        call_with_retry(SERVICE, &self.retry, || async move {
            let response = self
                .client
                .post(url)
                .header("api-key", &self.config.api_key)
                .json(request)
                .send()
                .await
                .map_err(|e| ImageSearchError::from_reqwest(SERVICE, e))?;

            let parsed: ChatResponse = ensure_success(SERVICE, response)
                .await?
                .json()
                .await
                .map_err(|e| ImageSearchError::from_reqwest(SERVICE, e))?;

            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .map(|content| content.trim().to_string())
                .filter(|content| !content.is_empty())
                .ok_or_else(|| ImageSearchError::UnexpectedPayload {
                    service: SERVICE,
                    message: "no completion content".to_string(),
                })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> AzureOpenAiChatProvider {
        let config = ChatConfig {
            endpoint: server.uri(),
            api_key: "chat-key".to_string(),
            deployment: "gpt-4o".to_string(),
            api_version: "2024-02-01".to_string(),
        };
        let downstream = DownstreamConfig {
            timeout: Duration::from_secs(2),
            retry: RetryPolicy::none(),
            asset_fetch_concurrency: 1,
            ..DownstreamConfig::default()
        };
        AzureOpenAiChatProvider::new(config, &downstream).unwrap()
    }

    #[tokio::test]
    async fn test_complete_sends_system_and_user_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/openai/deployments/gpt-4o/chat/completions"))
            .and(query_param("api-version", "2024-02-01"))
            .and(header("api-key", "chat-key"))
            .and(body_json(json!({
                "messages": [
                    {"role": "system", "content": "You are helpful assistant. "},
                    {"role": "user", "content": "find red cars"}
                ],
                "max_tokens": 200
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"index": 0, "message": {"role": "assistant", "content": " red sports car \n"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let answer = provider(&server).complete("find red cars").await.unwrap();
        assert_eq!(answer, "red sports car");
    }

    #[tokio::test]
    async fn test_empty_content_is_unexpected_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": null}}]
            })))
            .mount(&server)
            .await;

        let err = provider(&server).complete("x").await.unwrap_err();
        assert!(matches!(err, ImageSearchError::UnexpectedPayload { service: "chat", .. }));
    }

    #[tokio::test]
    async fn test_throttling_maps_to_upstream_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let err = provider(&server).complete("x").await.unwrap_err();
        assert!(err.is_transient());
        assert!(matches!(err, ImageSearchError::Upstream { status: Some(429), .. }));
    }

    #[test]
    fn test_chat_config_defaults_api_version() {
        temp_env::with_vars(
            [
                ("AZURE_OPENAI_ENDPOINT", Some("https://oai.example.com")),
                ("AZURE_OPENAI_API_KEY", Some("k")),
                ("OPEN_AI_MODEL", Some("gpt-4o")),
                ("API_VERSION", None),
            ],
            || {
                let config = ChatConfig::from_env().unwrap();
                assert_eq!(config.api_version, "2024-02-01");
                assert_eq!(config.deployment, "gpt-4o");
            },
        );
    }
}
