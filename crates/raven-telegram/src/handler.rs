//! Update handling: commands, text turns and voice turns.

use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::types::{ChatAction, Message as TelegramMessage, Voice};
use teloxide::RequestError;
use tracing::{debug, info, warn};

use raven_core::error::{RavenError, RavenResult};
use raven_core::traits::{SpeechToText, TextToSpeech};
use raven_core::types::Inbound;
use raven_core::Conversation;

use crate::command::{
    whoami_reply, Command, REMEMBER_REPLY, REMEMBER_USAGE, START_MARKER, START_REPLY,
};
use crate::outbox::send_voice_note;

const VOICE_UPLOAD_NAME: &str = "voice.ogg";

/// Download URL of a file already resolved with `getFile`.
pub fn file_url(token: &str, file_path: &str) -> String {
    format!("https://api.telegram.org/file/bot{}/{}", token, file_path)
}

fn send_error(e: RequestError) -> RavenError {
    RavenError::delivery(format!("Telegram request failed: {}", e))
}

/// Routes each incoming message into the conversation.
pub struct RavenBot {
    conversation: Arc<Conversation>,
    stt: Option<Arc<dyn SpeechToText>>,
    tts: Option<Arc<dyn TextToSpeech>>,
    http: reqwest::Client,
}

impl RavenBot {
    pub fn new(conversation: Arc<Conversation>) -> Self {
        Self {
            conversation,
            stt: None,
            tts: None,
            http: reqwest::Client::new(),
        }
    }

    /// Enable voice input, and voice replies when `tts` is set.
    pub fn with_speech(
        mut self,
        stt: Arc<dyn SpeechToText>,
        tts: Option<Arc<dyn TextToSpeech>>,
    ) -> Self {
        self.stt = Some(stt);
        self.tts = tts;
        self
    }

    pub async fn handle_message(&self, bot: Bot, msg: TelegramMessage) -> RavenResult<()> {
        if let Some(text) = msg.text() {
            if let Some(command) = Command::parse(text) {
                return self.handle_command(&bot, &msg, command).await;
            }
            if Command::is_command(text) {
                debug!(chat_id = msg.chat.id.0, "Ignoring unknown command");
                return Ok(());
            }
            return self.handle_turn(&bot, &msg, Inbound::text(text)).await;
        }

        if let Some(voice) = msg.voice() {
            let Some(stt) = &self.stt else {
                warn!("Voice message received but speech is not configured");
                return Ok(());
            };

            let audio = self.download_voice(&bot, voice).await?;
            let transcript = stt.transcribe(&audio, VOICE_UPLOAD_NAME).await?;
            if transcript.is_empty() {
                info!("Voice message transcribed but empty, ignoring");
                return Ok(());
            }
            info!(chars = transcript.chars().count(), "Voice message transcribed");
            return self.handle_turn(&bot, &msg, Inbound::voice(transcript)).await;
        }

        Ok(())
    }

    async fn handle_command(
        &self,
        bot: &Bot,
        msg: &TelegramMessage,
        command: Command,
    ) -> RavenResult<()> {
        let chat_id = msg.chat.id;
        let reply = match command {
            Command::Start => {
                self.conversation.log_system(START_MARKER)?;
                START_REPLY.to_string()
            }
            Command::WhoAmI => whoami_reply(chat_id.0),
            Command::Remember(arg) if arg.is_empty() => REMEMBER_USAGE.to_string(),
            Command::Remember(arg) => {
                self.conversation.remember_command(&arg)?;
                REMEMBER_REPLY.to_string()
            }
        };

        bot.send_message(chat_id, reply).await.map_err(send_error)?;
        Ok(())
    }

    async fn handle_turn(
        &self,
        bot: &Bot,
        msg: &TelegramMessage,
        inbound: Inbound,
    ) -> RavenResult<()> {
        let chat_id = msg.chat.id;

        if let Err(e) = bot.send_chat_action(chat_id, ChatAction::Typing).await {
            debug!(error = %e, "Typing indicator failed");
        }

        let outcome = self.conversation.handle(inbound).await?;
        bot.send_message(chat_id, outcome.reply.clone())
            .await
            .map_err(send_error)?;

        if let Some(tts) = &self.tts {
            if let Err(e) = send_voice_note(bot, chat_id, tts.as_ref(), &outcome.reply).await {
                warn!(error = %e, "Voice reply dropped");
            }
        }
        Ok(())
    }

    async fn download_voice(&self, bot: &Bot, voice: &Voice) -> RavenResult<Vec<u8>> {
        let file = bot.get_file(voice.file.id.clone()).await.map_err(|e| {
            RavenError::transcription(format!("Failed to get file info: {}", e))
        })?;

        let response = self
            .http
            .get(file_url(bot.token(), &file.path))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| RavenError::transcription(format!("Failed to download file: {}", e)))?;

        let data = response
            .bytes()
            .await
            .map_err(|e| RavenError::transcription(format!("Failed to read file bytes: {}", e)))?
            .to_vec();

        debug!(size = data.len(), "Downloaded voice message");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_url() {
        assert_eq!(
            file_url("123:abc", "voice/file_7.oga"),
            "https://api.telegram.org/file/bot123:abc/voice/file_7.oga"
        );
    }
}
