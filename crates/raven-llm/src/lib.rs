//! raven-llm - Generation and speech providers for raven.
//!
//! # Supported Providers
//!
//! - **OpenAI** (feature: `openai`) - chat completions via `async-openai`
//! - **Anthropic** - Claude messages API over `reqwest`
//! - **OpenAI speech** - `tts-1` voice notes and Whisper transcription
//!
//! # Example
//!
//! ```ignore
//! use raven_llm::LlmFactory;
//!
//! let llm = LlmFactory::from_config(&config.llm)?;
//! let speech = LlmFactory::speech(&config)?;
//! ```

mod anthropic;
mod factory;
mod openai;
mod speech;

pub use anthropic::AnthropicLlm;
pub use factory::LlmFactory;
pub use openai::OpenAIProvider;
pub use speech::OpenAISpeech;

// Re-export core types for convenience
pub use raven_core::config::LlmProvider;
pub use raven_core::traits::{
    GenerationOptions, Llm, LlmConfig, LlmResponse, SpeechToText, TextToSpeech,
};
