//! Configuration system for raven.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{RavenError, RavenResult};
use crate::traits::LlmConfig;

/// Default cron expression for the proactive outreach (sec min hour dom mon dow).
pub const DEFAULT_OUTREACH_CRON: &str = "0 30 2 * * *";

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenAI,
    Anthropic,
}

impl LlmProvider {
    /// Environment variable holding this provider's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl std::str::FromStr for LlmProvider {
    type Err = RavenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAI),
            "anthropic" => Ok(LlmProvider::Anthropic),
            other => Err(RavenError::UnsupportedProvider {
                provider: other.to_string(),
            }),
        }
    }
}

/// Provider configuration with type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmProviderConfig {
    /// Provider type.
    pub provider: LlmProvider,
    /// Provider-specific configuration.
    #[serde(flatten)]
    pub config: LlmConfig,
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAI,
            config: LlmConfig {
                model: "gpt-4.1-mini".to_string(),
                ..Default::default()
            },
        }
    }
}

/// Speech models used by the transports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Attach a synthesized voice note after text replies.
    pub voice_replies: bool,
    pub tts_model: String,
    pub tts_voice: String,
    pub stt_model: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            voice_replies: true,
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            stt_model: "whisper-1".to_string(),
        }
    }
}

/// Per-turn knobs of the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Dialog rows fed to generation.
    pub history_window: usize,
    /// Facts rendered into the memory block.
    pub facts_limit: usize,
    /// Chance of appending one emoji to a reply.
    pub emoji_probability: f64,
    /// Sleep `min(2.0 + len/25, 4.5)` seconds before generating.
    pub thinking_delay: bool,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_window: 10,
            facts_limit: 30,
            emoji_probability: 0.35,
            thinking_delay: true,
        }
    }
}

/// Exponential backoff for the generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts in total, including the first one.
    pub max_attempts: u32,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
    pub factor: f32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            min_delay_ms: 1_000,
            max_delay_ms: 8_000,
            factor: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            min_delay_ms: 0,
            max_delay_ms: 0,
            factor: 1.0,
        }
    }
}

/// Proactive outreach schedule and destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutreachConfig {
    pub enabled: bool,
    /// Six-field cron expression, evaluated in local time.
    pub cron: String,
    /// Telegram chat id to write to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    /// Webhook endpoint used by the HTTP server.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// HMAC secret for webhook signatures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_secret: Option<String>,
}

impl Default for OutreachConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: DEFAULT_OUTREACH_CRON.to_string(),
            chat_id: None,
            webhook_url: None,
            webhook_secret: None,
        }
    }
}

/// Main raven configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RavenConfig {
    /// LLM configuration.
    pub llm: LlmProviderConfig,
    /// Speech configuration.
    pub speech: SpeechConfig,
    pub conversation: ConversationConfig,
    pub retry: RetryPolicy,
    pub outreach: OutreachConfig,
    /// Path to the SQLite database.
    pub db_path: PathBuf,
    /// Replaces the built-in persona template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona_prompt: Option<String>,
}

impl Default for RavenConfig {
    fn default() -> Self {
        let raven_dir = dirs::home_dir()
            .map(|h| h.join(".raven"))
            .unwrap_or_else(|| PathBuf::from(".raven"));

        Self {
            llm: LlmProviderConfig::default(),
            speech: SpeechConfig::default(),
            conversation: ConversationConfig::default(),
            retry: RetryPolicy::default(),
            outreach: OutreachConfig::default(),
            db_path: raven_dir.join("raven_memory.sqlite"),
            persona_prompt: None,
        }
    }
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl RavenConfig {
    /// Load configuration from a file (TOML, JSON, or YAML).
    pub fn from_file(path: impl AsRef<Path>) -> RavenResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let ext = path.as_ref().extension().and_then(|e| e.to_str());

        match ext {
            Some("toml") => {
                toml::from_str(&content).map_err(|e| RavenError::Configuration(e.to_string()))
            }
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| RavenError::Configuration(e.to_string())),
            Some("yaml" | "yml") => serde_yaml::from_str(&content)
                .map_err(|e| RavenError::Configuration(e.to_string())),
            _ => Err(RavenError::Configuration(
                "Unsupported config file format. Use .toml, .json, or .yaml".to_string(),
            )),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay environment variables onto an existing configuration.
    pub fn apply_env(&mut self) {
        if let Some(provider) = non_empty_env("RAVEN_LLM_PROVIDER") {
            match provider.parse() {
                Ok(provider) => self.llm.provider = provider,
                Err(e) => tracing::warn!(error = %e, "Ignoring RAVEN_LLM_PROVIDER"),
            }
        }
        if let Some(model) = non_empty_env("RAVEN_LLM_MODEL") {
            self.llm.config.model = model;
        }
        if let Some(api_key) = non_empty_env(self.llm.provider.api_key_var()) {
            self.llm.config.api_key = Some(api_key);
        }

        if let Some(path) = non_empty_env("RAVEN_DB_PATH") {
            self.db_path = PathBuf::from(path);
        }

        if let Some(chat_id) = non_empty_env("RAVEN_OUTREACH_CHAT_ID") {
            self.outreach.chat_id = Some(chat_id);
        }
        if let Some(cron) = non_empty_env("RAVEN_OUTREACH_CRON") {
            self.outreach.cron = cron;
        }
        if let Some(url) = non_empty_env("RAVEN_OUTREACH_WEBHOOK_URL") {
            self.outreach.webhook_url = Some(url);
        }
        if let Some(secret) = non_empty_env("RAVEN_OUTREACH_WEBHOOK_SECRET") {
            self.outreach.webhook_secret = Some(secret);
        }

        if env_flag("RAVEN_DISABLE_THINKING_DELAY") == Some(true) {
            self.conversation.thinking_delay = false;
        }
    }

    /// Refuse to start on a configuration that cannot serve a turn.
    pub fn validate(&self) -> RavenResult<()> {
        let has_key = self
            .llm
            .config
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty());
        if !has_key {
            return Err(RavenError::missing_credential(
                self.llm.provider.api_key_var(),
            ));
        }

        if self.llm.config.model.trim().is_empty() {
            return Err(RavenError::Configuration("llm.model is empty".to_string()));
        }
        if !(0.0..=1.0).contains(&self.conversation.emoji_probability) {
            return Err(RavenError::Configuration(format!(
                "conversation.emoji_probability must be within [0, 1], got {}",
                self.conversation.emoji_probability
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(RavenError::Configuration(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Build configuration using builder pattern.
    pub fn builder() -> RavenConfigBuilder {
        RavenConfigBuilder::default()
    }
}

/// Builder for RavenConfig.
#[derive(Default)]
pub struct RavenConfigBuilder {
    config: RavenConfig,
}

impl RavenConfigBuilder {
    /// Set LLM configuration.
    pub fn llm(mut self, config: LlmProviderConfig) -> Self {
        self.config.llm = config;
        self
    }

    /// Set the API key of the configured provider.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.llm.config.api_key = Some(key.into());
        self
    }

    pub fn speech(mut self, config: SpeechConfig) -> Self {
        self.config.speech = config;
        self
    }

    pub fn conversation(mut self, config: ConversationConfig) -> Self {
        self.config.conversation = config;
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn outreach(mut self, config: OutreachConfig) -> Self {
        self.config.outreach = config;
        self
    }

    /// Set database path.
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    /// Replace the persona template.
    pub fn persona_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.persona_prompt = Some(prompt.into());
        self
    }

    /// Build the configuration.
    pub fn build(self) -> RavenConfig {
        self.config
    }
}
