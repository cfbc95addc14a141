//! Anthropic (Claude) LLM provider implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use raven_core::error::{RavenError, RavenResult};
use raven_core::traits::{GenerationOptions, Llm, LlmConfig, LlmResponse, TokenUsage};
use raven_core::types::{Message, MessageRole};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-5-haiku-latest";

/// Anthropic LLM provider.
pub struct AnthropicLlm {
    client: Client,
    config: LlmConfig,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize, PartialEq)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

fn header(value: &str, what: &str) -> RavenResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| RavenError::Configuration(format!("Invalid {} header", what)))
}

impl AnthropicLlm {
    /// Create a new Anthropic LLM provider.
    pub fn new(config: LlmConfig) -> RavenResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("ANTHROPIC_API_KEY").ok())
            .ok_or_else(|| RavenError::missing_credential("ANTHROPIC_API_KEY"))?;

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", header(&api_key, "API key")?);
        headers.insert("anthropic-version", header(ANTHROPIC_VERSION, "version")?);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RavenError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| ANTHROPIC_API_URL.to_string());

        let mut config = config;
        if config.model.is_empty() {
            config.model = DEFAULT_ANTHROPIC_MODEL.to_string();
        }

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// System entries go to the `system` field; the dialog must open with a
    /// user turn, so leading assistant rows are dropped.
    fn build_request(&self, messages: &[Message], options: GenerationOptions) -> AnthropicRequest {
        let system = messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let dialog: Vec<AnthropicMessage> = messages
            .iter()
            .filter(|m| m.role != MessageRole::System)
            .skip_while(|m| m.role == MessageRole::Assistant)
            .map(|m| AnthropicMessage {
                role: match m.role {
                    MessageRole::Assistant => "assistant",
                    _ => "user",
                },
                content: m.content.clone(),
            })
            .collect();

        AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: options.max_tokens.unwrap_or(self.config.max_tokens),
            temperature: Some(options.temperature.unwrap_or(self.config.temperature)),
            system: (!system.is_empty()).then_some(system),
            messages: dialog,
        }
    }
}

#[async_trait]
impl Llm for AnthropicLlm {
    async fn generate(
        &self,
        messages: &[Message],
        options: Option<GenerationOptions>,
    ) -> RavenResult<LlmResponse> {
        let request = self.build_request(messages, options.unwrap_or_default());

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                RavenError::llm_connection(format!("Anthropic API request failed: {}", e))
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RavenError::llm(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let message = serde_json::from_str::<AnthropicError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(RavenError::llm(format!(
                "Anthropic API error ({}): {}",
                status, message
            )));
        }

        let response: AnthropicResponse = serde_json::from_str(&body)
            .map_err(|e| RavenError::llm(format!("Failed to parse response: {}", e)))?;

        let content = response
            .content
            .into_iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text)
            .next();

        let usage = response.usage.map(|u| TokenUsage {
            prompt_tokens: u.input_tokens,
            completion_tokens: u.output_tokens,
            total_tokens: u.input_tokens + u.output_tokens,
        });

        Ok(LlmResponse { content, usage })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
