//! Message types for generation requests and the dialog log.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Role of a message in a conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    System,
    #[default]
    User,
    Assistant,
}

/// A role/content pair sent to the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    /// Create a new message with an explicit role.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }
}

/// Where an inbound text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InboundSource {
    #[default]
    Text,
    /// Transcribed from a voice note; logged with a `(voice)` prefix.
    Voice,
}

/// An inbound message as the transport hands it to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub text: String,
    pub source: InboundSource,
}

impl Inbound {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: InboundSource::Text,
        }
    }

    pub fn voice(transcript: impl Into<String>) -> Self {
        Self {
            text: transcript.into(),
            source: InboundSource::Voice,
        }
    }

    /// Content written to the dialog log for this message.
    pub fn logged_content(&self) -> String {
        match self.source {
            InboundSource::Text => self.text.clone(),
            InboundSource::Voice => format!("(voice) {}", self.text),
        }
    }
}

/// Render messages as `role: content` lines.
pub fn format_messages(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|msg| format!("{}: {}", msg.role, msg.content))
        .collect::<Vec<_>>()
        .join("\n")
}
