//! Speech and outbound delivery traits.
//!
//! None of these are called from inside a turn. Transports use speech to turn
//! voice notes into text and replies into voice, and the proactive scheduler
//! hands its text to an [`Outbox`].

use async_trait::async_trait;

use crate::error::RavenResult;

/// Speech-to-text service.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Transcribe encoded audio (e.g. OGG/Opus) into text.
    async fn transcribe(&self, audio: &[u8], file_name: &str) -> RavenResult<String>;
}

/// Text-to-speech service.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesize text into encoded audio.
    async fn synthesize(&self, text: &str) -> RavenResult<Vec<u8>>;
}

/// Outbound delivery of proactively generated text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Outbox: Send + Sync {
    /// Deliver `text` to `destination` (a chat id, a webhook, ...).
    async fn deliver(&self, destination: &str, text: &str) -> RavenResult<()>;
}
