//! OpenAI speech endpoints: text-to-speech and Whisper transcription.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use raven_core::config::SpeechConfig;
use raven_core::error::{RavenError, RavenResult};
use raven_core::traits::{SpeechToText, TextToSpeech};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// OGG/Opus, what Telegram plays as a voice note.
const VOICE_FORMAT: &str = "opus";

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// OpenAI speech client.
pub struct OpenAISpeech {
    client: Client,
    api_key: String,
    base_url: String,
    config: SpeechConfig,
}

impl OpenAISpeech {
    /// Create a speech client; falls back to `OPENAI_API_KEY` when `api_key` is `None`.
    pub fn new(api_key: Option<String>, config: SpeechConfig) -> RavenResult<Self> {
        let api_key = api_key
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| RavenError::missing_credential("OPENAI_API_KEY"))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| RavenError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            base_url: OPENAI_API_BASE.to_string(),
            config,
        })
    }

    /// Point the client at another OpenAI-compatible endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn config(&self) -> &SpeechConfig {
        &self.config
    }

    async fn error_text(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        format!("{}: {}", status, body)
    }
}

#[async_trait]
impl TextToSpeech for OpenAISpeech {
    async fn synthesize(&self, text: &str) -> RavenResult<Vec<u8>> {
        let request = SpeechRequest {
            model: &self.config.tts_model,
            input: text,
            voice: &self.config.tts_voice,
            response_format: VOICE_FORMAT,
        };

        tracing::debug!(
            model = %self.config.tts_model,
            voice = %self.config.tts_voice,
            chars = text.chars().count(),
            "OpenAI TTS request"
        );

        let response = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RavenError::synthesis(format!("TTS request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RavenError::synthesis(format!(
                "OpenAI TTS error ({})",
                Self::error_text(response).await
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| RavenError::synthesis(format!("Failed to read audio: {}", e)))?;
        if audio.is_empty() {
            return Err(RavenError::synthesis("OpenAI TTS returned no audio"));
        }
        Ok(audio.to_vec())
    }
}

#[async_trait]
impl SpeechToText for OpenAISpeech {
    async fn transcribe(&self, audio: &[u8], file_name: &str) -> RavenResult<String> {
        let part = Part::bytes(audio.to_vec()).file_name(file_name.to_string());
        let form = Form::new()
            .text("model", self.config.stt_model.clone())
            .part("file", part);

        tracing::debug!(
            model = %self.config.stt_model,
            bytes = audio.len(),
            "OpenAI transcription request"
        );

        let response = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RavenError::transcription(format!("Transcription request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RavenError::transcription(format!(
                "OpenAI transcription error ({})",
                Self::error_text(response).await
            )));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| RavenError::transcription(format!("Failed to parse transcription: {}", e)))?;
        Ok(parsed.text.trim().to_string())
    }
}
