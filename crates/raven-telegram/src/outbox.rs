//! Proactive delivery into a Telegram chat.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use tracing::{info, warn};

use raven_core::error::{ErrorCode, RavenError, RavenResult};
use raven_core::traits::{Outbox, TextToSpeech};

/// File name of synthesized voice notes.
pub const VOICE_FILE_NAME: &str = "raven.ogg";

/// Parse an outreach destination into a chat id.
pub fn parse_chat_id(destination: &str) -> RavenResult<ChatId> {
    destination
        .trim()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| RavenError::Delivery {
            message: format!("'{}' is not a Telegram chat id", destination),
            code: ErrorCode::DlvRejected,
            source: None,
        })
}

/// Send a synthesized voice note. Callers treat failures as best-effort.
pub async fn send_voice_note(
    bot: &Bot,
    chat_id: ChatId,
    tts: &dyn TextToSpeech,
    text: &str,
) -> RavenResult<()> {
    let audio = tts.synthesize(text).await?;
    bot.send_voice(chat_id, InputFile::memory(audio).file_name(VOICE_FILE_NAME))
        .await
        .map_err(|e| RavenError::delivery(format!("Failed to send voice note: {}", e)))?;
    Ok(())
}

/// Delivers text, then a best-effort voice note.
pub struct TelegramOutbox {
    bot: Bot,
    tts: Option<Arc<dyn TextToSpeech>>,
}

impl TelegramOutbox {
    pub fn new(bot: Bot, tts: Option<Arc<dyn TextToSpeech>>) -> Self {
        Self { bot, tts }
    }
}

#[async_trait]
impl Outbox for TelegramOutbox {
    async fn deliver(&self, destination: &str, text: &str) -> RavenResult<()> {
        let chat_id = parse_chat_id(destination)?;

        self.bot
            .send_message(chat_id, text)
            .await
            .map_err(|e| RavenError::Delivery {
                message: format!("Failed to send outreach to {}: {}", chat_id.0, e),
                code: ErrorCode::DlvTransient,
                source: Some(Box::new(e)),
            })?;
        info!(chat_id = chat_id.0, "Outreach text sent");

        if let Some(tts) = &self.tts {
            if let Err(e) = send_voice_note(&self.bot, chat_id, tts.as_ref(), text).await {
                warn!(error = %e, "Outreach voice note dropped");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_id() {
        assert_eq!(parse_chat_id("123456").unwrap(), ChatId(123456));
        assert_eq!(parse_chat_id(" -100987 ").unwrap(), ChatId(-100987));
    }

    #[test]
    fn test_bad_chat_id_is_rejected() {
        let err = parse_chat_id("diana").unwrap_err();
        assert_eq!(err.code(), ErrorCode::DlvRejected);
    }
}
