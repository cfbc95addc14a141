//! Factory for creating generation and speech providers.

use std::sync::Arc;

use raven_core::config::{LlmProvider, LlmProviderConfig, RavenConfig};
use raven_core::error::RavenResult;
use raven_core::traits::{Llm, LlmConfig};

use crate::anthropic::AnthropicLlm;
use crate::openai::OpenAIProvider;
use crate::speech::OpenAISpeech;

/// Factory for creating LLM providers.
pub struct LlmFactory;

impl LlmFactory {
    /// Create an LLM provider from the given configuration.
    pub fn create(provider: LlmProvider, config: LlmConfig) -> RavenResult<Arc<dyn Llm>> {
        tracing::info!(provider = ?provider, model = %config.model, "Creating LLM provider");
        match provider {
            LlmProvider::OpenAI => Ok(Arc::new(OpenAIProvider::new(config)?)),
            LlmProvider::Anthropic => Ok(Arc::new(AnthropicLlm::new(config)?)),
        }
    }

    /// Create the provider described by an `[llm]` config section.
    pub fn from_config(config: &LlmProviderConfig) -> RavenResult<Arc<dyn Llm>> {
        Self::create(config.provider, config.config.clone())
    }

    /// Speech always goes through OpenAI, whatever the chat provider.
    ///
    /// Reuses the chat key when the chat provider is OpenAI, else reads
    /// `OPENAI_API_KEY`.
    pub fn speech(config: &RavenConfig) -> RavenResult<Arc<OpenAISpeech>> {
        let api_key = match config.llm.provider {
            LlmProvider::OpenAI => config.llm.config.api_key.clone(),
            LlmProvider::Anthropic => None,
        };
        Ok(Arc::new(OpenAISpeech::new(api_key, config.speech.clone())?))
    }
}
