//! OpenAI chat provider implementation.

#[cfg(feature = "openai")]
use std::time::Duration;

use async_trait::async_trait;

use raven_core::error::{RavenError, RavenResult};
use raven_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, TokenUsage};
use raven_core::types::{Message, MessageRole};

#[cfg(feature = "openai")]
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessage, ChatCompletionRequestAssistantMessageContent,
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    },
    Client,
};

pub(crate) const DEFAULT_OPENAI_MODEL: &str = "gpt-4.1-mini";

/// OpenAI LLM provider.
pub struct OpenAIProvider {
    #[cfg(feature = "openai")]
    client: Client<OpenAIConfig>,
    config: LlmConfig,
}

impl OpenAIProvider {
    /// Create a new OpenAI LLM provider.
    pub fn new(config: LlmConfig) -> RavenResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or_else(|| RavenError::missing_credential("OPENAI_API_KEY"))?;

        #[cfg(feature = "openai")]
        let client = {
            let openai_config = match config.base_url {
                Some(ref base_url) => OpenAIConfig::new()
                    .with_api_key(api_key)
                    .with_api_base(base_url),
                None => OpenAIConfig::new().with_api_key(api_key),
            };
            let http_client = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()
                .map_err(|e| {
                    RavenError::Configuration(format!("Failed to create HTTP client: {}", e))
                })?;
            Client::with_config(openai_config).with_http_client(http_client)
        };
        #[cfg(not(feature = "openai"))]
        let _ = api_key;

        let mut config = config;
        if config.model.is_empty() {
            config.model = DEFAULT_OPENAI_MODEL.to_string();
        }

        Ok(Self {
            #[cfg(feature = "openai")]
            client,
            config,
        })
    }

    /// Reasoning models reject sampling parameters.
    fn is_reasoning_model(&self) -> bool {
        let model = self.config.model.to_lowercase();
        ["o1", "o3", "o4", "gpt-5"]
            .iter()
            .any(|prefix| model.starts_with(prefix))
    }

    #[cfg(feature = "openai")]
    fn message_to_openai(msg: &Message) -> ChatCompletionRequestMessage {
        match msg.role {
            MessageRole::System => {
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(msg.content.clone()),
                    name: None,
                })
            }
            MessageRole::User => {
                ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                    content: ChatCompletionRequestUserMessageContent::Text(msg.content.clone()),
                    name: None,
                })
            }
            MessageRole::Assistant => {
                ChatCompletionRequestMessage::Assistant(ChatCompletionRequestAssistantMessage {
                    content: Some(ChatCompletionRequestAssistantMessageContent::Text(
                        msg.content.clone(),
                    )),
                    ..Default::default()
                })
            }
        }
    }
}

#[async_trait]
impl Llm for OpenAIProvider {
    #[cfg(feature = "openai")]
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> RavenResult<LlmResponse> {
        let options = options.unwrap_or_default();

        let mut request = CreateChatCompletionRequest {
            model: self.config.model.clone(),
            messages: messages.iter().map(Self::message_to_openai).collect(),
            ..Default::default()
        };

        if !self.is_reasoning_model() {
            request.temperature = Some(options.temperature.unwrap_or(self.config.temperature));
            request.max_tokens = Some(options.max_tokens.unwrap_or(self.config.max_tokens));
        }

        tracing::debug!(
            model = %self.config.model,
            messages = messages.len(),
            temperature = ?request.temperature,
            "OpenAI chat request"
        );

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| match e {
                OpenAIError::Reqwest(e) => {
                    RavenError::llm_connection(format!("OpenAI request failed: {}", e))
                }
                other => RavenError::llm(format!("OpenAI API error: {}", other)),
            })?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| RavenError::llm("No response choices returned"))?;

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(LlmResponse {
            content: choice.message.content.clone(),
            usage,
        })
    }

    #[cfg(not(feature = "openai"))]
    async fn generate(
        &self,
        _messages: &[Message],
        _options: Option<GenerationOptions>,
    ) -> RavenResult<LlmResponse> {
        Err(RavenError::Configuration(
            "OpenAI feature not enabled. Enable the 'openai' feature.".to_string(),
        ))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raven_core::error::ErrorCode;

    fn provider(model: &str) -> OpenAIProvider {
        OpenAIProvider::new(LlmConfig {
            model: model.to_string(),
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_default_model() {
        assert_eq!(provider("").model_name(), DEFAULT_OPENAI_MODEL);
    }

    #[test]
    fn test_reasoning_models() {
        assert!(provider("o3-mini").is_reasoning_model());
        assert!(!provider("gpt-4.1-mini").is_reasoning_model());
    }

    #[cfg(feature = "openai")]
    #[tokio::test]
    async fn test_stalled_backend_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept connections and never answer.
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let provider = OpenAIProvider::new(LlmConfig {
            model: "gpt-4.1-mini".to_string(),
            api_key: Some("sk-test".to_string()),
            base_url: Some(format!("http://{}/v1", addr)),
            timeout_secs: 1,
            ..Default::default()
        })
        .unwrap();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            provider.generate(&[Message::user("привет")], None),
        )
        .await
        .expect("generation should give up after timeout_secs");

        let err = result.unwrap_err();
        assert_eq!(err.code(), ErrorCode::LlmConnectionFailed);
        assert!(err.is_retryable());
    }

    #[cfg(feature = "openai")]
    #[test]
    fn test_roles_map_to_openai_messages() {
        let mapped: Vec<_> = [
            Message::system("persona"),
            Message::user("привет"),
            Message::assistant("я здесь"),
        ]
        .iter()
        .map(OpenAIProvider::message_to_openai)
        .collect();

        assert!(matches!(mapped[0], ChatCompletionRequestMessage::System(_)));
        assert!(matches!(mapped[1], ChatCompletionRequestMessage::User(_)));
        assert!(matches!(mapped[2], ChatCompletionRequestMessage::Assistant(_)));
    }
}
