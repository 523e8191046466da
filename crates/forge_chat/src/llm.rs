//! LLM adapter for the generation backend.
//!
//! Supports the OpenAI chat completions and Anthropic messages APIs.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{BackendConfig, LlmProvider};
use crate::error::BackendError;
use crate::types::PromptPair;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;
const MAX_RETRIES: u32 = 3;

/// Produces raw text for a prompt pair.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, prompts: &PromptPair) -> Result<String, BackendError>;
}

/// HTTP client for one configured provider.
pub struct LlmAdapter {
    provider: LlmProvider,
    api_key: String,
    model: String,
    base_url: String,
    retry_base: Duration,
    client: reqwest::Client,
}

impl LlmAdapter {
    /// Create an adapter; `model` defaults to the provider's default.
    pub fn new(provider: LlmProvider, api_key: String, model: Option<String>) -> Self {
        let base_url = match provider {
            LlmProvider::OpenAI => OPENAI_BASE_URL,
            LlmProvider::Anthropic => ANTHROPIC_BASE_URL,
        };
        Self {
            provider,
            api_key,
            model: model.unwrap_or_else(|| provider.default_model().to_string()),
            base_url: base_url.to_string(),
            retry_base: Duration::from_secs(1),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        let adapter = Self::new(config.provider, config.api_key.clone(), Some(config.model.clone()));
        match &config.base_url {
            Some(url) => adapter.with_base_url(url.clone()),
            None => adapter,
        }
    }

    /// Point the adapter at a compatible gateway.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// First retry delay; doubles on each further attempt.
    pub fn with_retry_base(mut self, delay: Duration) -> Self {
        self.retry_base = delay;
        self
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        match self.provider {
            LlmProvider::OpenAI => format!("{}/chat/completions", self.base_url),
            LlmProvider::Anthropic => format!("{}/messages", self.base_url),
        }
    }

    async fn complete_openai(&self, prompts: &PromptPair) -> Result<String, BackendError> {
        let request = openai_request(&self.model, prompts);
        let response: OpenAIResponse = self
            .send_with_retry(|| {
                self.client
                    .post(self.endpoint())
                    .header("Authorization", format!("Bearer {}", self.api_key))
                    .json(&request)
            })
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| BackendError::Malformed("No choices in OpenAI response".into()))
    }

    async fn complete_anthropic(&self, prompts: &PromptPair) -> Result<String, BackendError> {
        let request = anthropic_request(&self.model, prompts);
        let response: AnthropicResponse = self
            .send_with_retry(|| {
                self.client
                    .post(self.endpoint())
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json(&request)
            })
            .await?;

        let text: Vec<String> = response
            .content
            .into_iter()
            .filter_map(|c| c.text)
            .collect();
        if text.is_empty() {
            return Err(BackendError::Malformed(
                "No text content in Anthropic response".into(),
            ));
        }
        Ok(text.join(""))
    }

    /// Send a request, retrying transient failures with exponential backoff.
    async fn send_with_retry<T, F>(&self, build: F) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::RequestBuilder,
    {
        let provider = self.provider.display_name();
        let mut attempt = 0;
        loop {
            if attempt > 0 {
                let delay = self.retry_base * (1 << (attempt - 1));
                debug!(provider, attempt, ?delay, "Retrying backend request");
                tokio::time::sleep(delay).await;
            }
            attempt += 1;

            let result = match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response
                            .json::<T>()
                            .await
                            .map_err(|e| BackendError::Malformed(e.to_string()));
                    }
                    let body = response.text().await.unwrap_or_default();
                    BackendError::Api {
                        provider: provider.to_string(),
                        status: status.as_u16(),
                        body,
                    }
                }
                Err(e) => BackendError::Network(e.to_string()),
            };

            if !result.is_transient() || attempt >= MAX_RETRIES {
                return Err(result);
            }
            warn!(provider, attempt, max = MAX_RETRIES, error = %result, "Transient backend error");
        }
    }
}

#[async_trait]
impl GenerationBackend for LlmAdapter {
    async fn generate(&self, prompts: &PromptPair) -> Result<String, BackendError> {
        debug!(provider = self.provider.display_name(), model = %self.model, "Calling backend");
        match self.provider {
            LlmProvider::OpenAI => self.complete_openai(prompts).await,
            LlmProvider::Anthropic => self.complete_anthropic(prompts).await,
        }
    }
}

fn openai_request(model: &str, prompts: &PromptPair) -> OpenAIRequest {
    OpenAIRequest {
        model: model.to_string(),
        messages: vec![
            ChatMessage {
                role: "system".into(),
                content: prompts.system_prompt.clone(),
            },
            ChatMessage {
                role: "user".into(),
                content: prompts.user_prompt.clone(),
            },
        ],
        max_completion_tokens: Some(MAX_TOKENS),
    }
}

fn anthropic_request(model: &str, prompts: &PromptPair) -> AnthropicRequest {
    AnthropicRequest {
        model: model.to_string(),
        max_tokens: MAX_TOKENS,
        system: Some(prompts.system_prompt.clone()).filter(|s| !s.is_empty()),
        messages: vec![ChatMessage {
            role: "user".into(),
            content: prompts.user_prompt.clone(),
        }],
    }
}

// OpenAI API types
#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

// Anthropic API types
#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompts() -> PromptPair {
        PromptPair {
            system_prompt: "sys".into(),
            user_prompt: "Build a todo app".into(),
        }
    }

    #[test]
    fn test_default_models() {
        let openai = LlmAdapter::new(LlmProvider::OpenAI, "key".into(), None);
        assert_eq!(openai.model(), "gpt-4o-mini");
        assert_eq!(openai.endpoint(), "https://api.openai.com/v1/chat/completions");

        let anthropic = LlmAdapter::new(LlmProvider::Anthropic, "key".into(), None);
        assert_eq!(anthropic.model(), "claude-3-5-sonnet-latest");
        assert_eq!(anthropic.endpoint(), "https://api.anthropic.com/v1/messages");
    }

    #[test]
    fn test_from_config() {
        let adapter = LlmAdapter::from_config(&BackendConfig {
            provider: LlmProvider::OpenAI,
            api_key: "sk".into(),
            model: "gpt-4.1".into(),
            base_url: Some("http://localhost:8080/v1/".into()),
        });
        assert_eq!(adapter.model(), "gpt-4.1");
        assert_eq!(adapter.endpoint(), "http://localhost:8080/v1/chat/completions");
    }

    #[test]
    fn test_openai_request_shape() {
        let value = serde_json::to_value(openai_request("gpt-4o-mini", &prompts())).unwrap();
        assert_eq!(value["model"], "gpt-4o-mini");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "Build a todo app");
        assert_eq!(value["max_completion_tokens"], 4096);
    }

    #[test]
    fn test_anthropic_request_shape() {
        let value = serde_json::to_value(anthropic_request("claude", &prompts())).unwrap();
        assert_eq!(value["system"], "sys");
        assert_eq!(value["messages"].as_array().unwrap().len(), 1);
        assert_eq!(value["messages"][0]["role"], "user");

        let empty = PromptPair {
            system_prompt: String::new(),
            user_prompt: "x".into(),
        };
        let value = serde_json::to_value(anthropic_request("claude", &empty)).unwrap();
        assert!(value.get("system").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let openai: OpenAIResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":"hi"}}]}"#)
                .unwrap();
        assert_eq!(openai.choices[0].message.content.as_deref(), Some("hi"));

        let anthropic: AnthropicResponse = serde_json::from_str(
            r#"{"content":[{"type":"text","text":"a"},{"type":"tool_use"},{"type":"text","text":"b"}]}"#,
        )
        .unwrap();
        let text: Vec<_> = anthropic.content.into_iter().filter_map(|c| c.text).collect();
        assert_eq!(text, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let adapter = LlmAdapter::new(LlmProvider::OpenAI, "key".into(), None)
            .with_base_url("http://127.0.0.1:9")
            .with_retry_base(Duration::from_millis(1));
        let err = adapter.generate(&prompts()).await.unwrap_err();
        assert!(matches!(err, BackendError::Network(_)));
    }
}
