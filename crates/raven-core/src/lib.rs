//! raven-core - Core library for raven.
//!
//! This crate provides the emotional state model, the trigger and fact
//! extraction tables, the SQLite memory, prompt assembly and the
//! conversation pipeline of the raven persona agent.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use raven_core::{Conversation, RavenConfig, SqliteStore};
//!
//! let config = RavenConfig::from_env();
//! let store = Arc::new(SqliteStore::new(&config.db_path)?);
//! let conversation = Conversation::from_config(&config, store.clone(), store, llm);
//!
//! let reply = conversation.handle_message("скучаю, обними").await?;
//! ```

pub mod config;
pub mod conversation;
pub mod error;
pub mod outreach;
pub mod prompts;
pub mod rules;
pub mod store;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use config::{
    ConversationConfig, LlmProvider, LlmProviderConfig, OutreachConfig, RavenConfig,
    RetryPolicy, SpeechConfig,
};
pub use conversation::{parse_remember, thinking_delay, Conversation, TurnOutcome, NOTE_KEY};
pub use error::{ErrorCode, RavenError, RavenResult};
pub use outreach::{Outreach, OutreachResult, OutreachScheduler, WebhookOutbox};
pub use prompts::{PromptAssembler, OUTREACH_INSTRUCTION, PERSONA_PROMPT};
pub use rules::{ExtractedFact, FactExtractor, TriggerCategory, TriggerEngine};
pub use store::SqliteStore;
pub use traits::{
    GenerationOptions, Llm, LlmConfig, LlmResponse, MemoryStore, Outbox, SpeechToText,
    StateStore, TextToSpeech, TokenUsage, NO_MEMORY_PLACEHOLDER,
};
pub use types::{
    DialogMessage, EmotionalState, Fact, Inbound, InboundSource, Message, MessageRole, Mode,
    StateDelta,
};
