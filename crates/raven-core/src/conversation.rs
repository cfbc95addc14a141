//! The conversation pipeline.
//!
//! One inbound message runs strictly in order:
//! 1. log the inbound text as a `user` row
//! 2. auto-extract facts
//! 3. apply triggers and write the state once
//! 4. optional thinking delay
//! 5. assemble the prompt and generate (retried with backoff)
//! 6. maybe append one emoji
//! 7. log the reply as an `assistant` row
//!
//! Steps 1-3 run under a turn gate so concurrent turns never lose a delta.
//! Generation runs outside it.

use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::{ConversationConfig, RavenConfig, RetryPolicy};
use crate::error::{RavenError, RavenResult};
use crate::prompts::{PromptAssembler, OUTREACH_INSTRUCTION};
use crate::rules::{ExtractedFact, FactExtractor, TriggerCategory, TriggerEngine};
use crate::traits::{GenerationOptions, Llm, MemoryStore, StateStore};
use crate::types::{
    format_messages, DialogMessage, EmotionalState, Fact, Inbound, Message, MessageRole, Mode,
};

/// Key used by `remember` when no `key=value` pair is given.
pub const NOTE_KEY: &str = "note";

const THINKING_BASE_SECS: f64 = 2.0;
const THINKING_CHARS_PER_SEC: f64 = 25.0;
const THINKING_MAX_SECS: f64 = 4.5;

/// `min(2.0 + chars/25, 4.5)` seconds.
pub fn thinking_delay(chars: usize) -> Duration {
    let secs = (THINKING_BASE_SECS + chars as f64 / THINKING_CHARS_PER_SEC).min(THINKING_MAX_SECS);
    Duration::from_secs_f64(secs)
}

/// Parse the argument of a remember command.
///
/// `key=value` splits on the first `=`, anything else is filed under
/// [`NOTE_KEY`]. Both parts are trimmed.
pub fn parse_remember(arg: &str) -> RavenResult<(String, String)> {
    let arg = arg.trim();
    if arg.is_empty() {
        return Err(RavenError::validation_with_suggestion(
            "Nothing to remember",
            "Use `key=value` or plain text",
        ));
    }

    match arg.split_once('=') {
        Some((key, value)) => {
            let key = key.trim();
            let key = if key.is_empty() { NOTE_KEY } else { key };
            Ok((key.to_string(), value.trim().to_string()))
        }
        None => Ok((NOTE_KEY.to_string(), arg.to_string())),
    }
}

/// What one turn did.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// Reply text, already logged.
    pub reply: String,
    pub mode: Mode,
    /// State as written by this turn.
    pub state: EmotionalState,
    pub triggered: Vec<TriggerCategory>,
    pub facts: Vec<ExtractedFact>,
}

/// Orchestrates turns over the stores and the generation service.
pub struct Conversation {
    state_store: Arc<dyn StateStore>,
    memory: Arc<dyn MemoryStore>,
    llm: Arc<dyn Llm>,
    triggers: TriggerEngine,
    extractor: FactExtractor,
    prompts: PromptAssembler,
    config: ConversationConfig,
    retry: RetryPolicy,
    max_tokens: u32,
    turn_gate: Mutex<()>,
}

impl Conversation {
    /// Create a conversation with default tables and settings.
    pub fn new(
        state_store: Arc<dyn StateStore>,
        memory: Arc<dyn MemoryStore>,
        llm: Arc<dyn Llm>,
    ) -> Self {
        Self {
            state_store,
            memory,
            llm,
            triggers: TriggerEngine::default(),
            extractor: FactExtractor::default(),
            prompts: PromptAssembler::default(),
            config: ConversationConfig::default(),
            retry: RetryPolicy::default(),
            max_tokens: crate::traits::LlmConfig::default().max_tokens,
            turn_gate: Mutex::new(()),
        }
    }

    /// Create a conversation configured from a [`RavenConfig`].
    pub fn from_config(
        config: &RavenConfig,
        state_store: Arc<dyn StateStore>,
        memory: Arc<dyn MemoryStore>,
        llm: Arc<dyn Llm>,
    ) -> Self {
        let prompts = config
            .persona_prompt
            .as_deref()
            .map(PromptAssembler::new)
            .unwrap_or_default();

        Self::new(state_store, memory, llm)
            .with_conversation_config(config.conversation.clone())
            .with_retry(config.retry.clone())
            .with_prompts(prompts)
            .with_max_tokens(config.llm.config.max_tokens)
    }

    pub fn with_conversation_config(mut self, config: ConversationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_prompts(mut self, prompts: PromptAssembler) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_triggers(mut self, triggers: TriggerEngine) -> Self {
        self.triggers = triggers;
        self
    }

    pub fn with_extractor(mut self, extractor: FactExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn config(&self) -> &ConversationConfig {
        &self.config
    }

    /// Model behind the generation provider.
    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    /// Run one turn with the mode of the current local time.
    pub async fn handle(&self, inbound: Inbound) -> RavenResult<TurnOutcome> {
        self.handle_in_mode(inbound, Mode::now()).await
    }

    /// Run one turn for plain text and return just the reply.
    pub async fn handle_message(&self, text: &str) -> RavenResult<String> {
        Ok(self.handle(Inbound::text(text)).await?.reply)
    }

    /// Run one turn in a fixed mode.
    #[instrument(skip(self, inbound), fields(source = ?inbound.source, chars = inbound.text.chars().count()))]
    pub async fn handle_in_mode(&self, inbound: Inbound, mode: Mode) -> RavenResult<TurnOutcome> {
        let (logged_id, state, triggered, facts) = {
            let _turn = self.turn_gate.lock().await;

            let logged_id = self
                .memory
                .log_message(MessageRole::User, &inbound.logged_content())?;

            let facts = self.extractor.extract(&inbound.text);
            for fact in &facts {
                self.memory.add_fact(&fact.key, &fact.value)?;
            }

            let outcome = self.triggers.evaluate(&inbound.text);
            let current = self.state_store.get_state()?;
            let state = self
                .state_store
                .set_state(&current.apply_delta(&outcome.delta))?;

            (logged_id, state, outcome.categories(), facts)
        };

        debug!(
            state = %state.summary(),
            triggered = ?triggered,
            facts = facts.len(),
            "State updated"
        );

        if self.config.thinking_delay {
            tokio::time::sleep(thinking_delay(inbound.text.chars().count())).await;
        }

        let history = self.history_excluding(logged_id)?;
        let reply = self.reply(&state, mode, &history, &inbound.text).await?;

        self.memory.log_message(MessageRole::Assistant, &reply)?;
        info!(mode = %mode, chars = reply.chars().count(), "Turn complete");

        Ok(TurnOutcome {
            reply,
            mode,
            state,
            triggered,
            facts,
        })
    }

    /// Generate the proactive outreach text in the current mode.
    pub async fn compose_outreach(&self) -> RavenResult<String> {
        self.compose_outreach_in_mode(Mode::now()).await
    }

    /// Generate the proactive outreach text without logging, triggers or extraction.
    pub async fn compose_outreach_in_mode(&self, mode: Mode) -> RavenResult<String> {
        let state = self.state_store.get_state()?;
        let history = self.recent_history(self.config.history_window)?;
        self.reply(&state, mode, &history, OUTREACH_INSTRUCTION)
            .await
    }

    /// Store an explicit fact.
    pub fn remember(&self, key: &str, value: &str) -> RavenResult<i64> {
        if key.trim().is_empty() {
            return Err(RavenError::validation("Fact key must not be empty"));
        }
        let id = self.memory.add_fact(key.trim(), value.trim())?;
        info!(key = key.trim(), "Fact remembered");
        Ok(id)
    }

    /// Parse `key=value` or bare text and store it. Returns the stored pair.
    pub fn remember_command(&self, arg: &str) -> RavenResult<(String, String)> {
        let (key, value) = parse_remember(arg)?;
        self.memory.add_fact(&key, &value)?;
        info!(key = %key, "Fact remembered");
        Ok((key, value))
    }

    /// Append a `system` row (e.g. the `/start` marker).
    pub fn log_system(&self, content: &str) -> RavenResult<i64> {
        self.memory.log_message(MessageRole::System, content)
    }

    pub fn state(&self) -> RavenResult<EmotionalState> {
        self.state_store.get_state()
    }

    pub fn recent_facts(&self, limit: usize) -> RavenResult<Vec<Fact>> {
        self.memory.recent_facts(limit)
    }

    pub fn recent_messages(&self, n: usize) -> RavenResult<Vec<DialogMessage>> {
        self.memory.recent_messages(n)
    }

    fn recent_history(&self, n: usize) -> RavenResult<Vec<Message>> {
        Ok(self
            .memory
            .recent_messages(n)?
            .into_iter()
            .map(Message::from)
            .collect())
    }

    /// Trailing window without the row just logged for this turn.
    fn history_excluding(&self, logged_id: i64) -> RavenResult<Vec<Message>> {
        let window = self.config.history_window;
        let mut rows: Vec<DialogMessage> = self
            .memory
            .recent_messages(window.saturating_add(1))?
            .into_iter()
            .filter(|row| row.id != logged_id)
            .collect();
        if rows.len() > window {
            rows.drain(..rows.len() - window);
        }
        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn reply(
        &self,
        state: &EmotionalState,
        mode: Mode,
        history: &[Message],
        user_text: &str,
    ) -> RavenResult<String> {
        let facts = self.memory.recent_facts_text(self.config.facts_limit)?;
        let messages = self.prompts.build(state, mode, &facts, history, user_text);
        trace!(prompt = %format_messages(&messages), "Generation context");

        let options = GenerationOptions {
            temperature: Some(mode.temperature()),
            max_tokens: Some(self.max_tokens),
        };
        let text = self.generate(&messages, options).await?;
        Ok(self.decorate(text, state))
    }

    async fn generate(
        &self,
        messages: &[Message],
        options: GenerationOptions,
    ) -> RavenResult<String> {
        let attempt = || async {
            let response = self.llm.generate(messages, Some(options.clone())).await?;
            response
                .content
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .ok_or_else(RavenError::empty_response)
        };

        let policy = &self.retry;
        attempt
            .retry(
                ExponentialBuilder::default()
                    .with_max_times(policy.max_attempts.saturating_sub(1) as usize)
                    .with_min_delay(Duration::from_millis(policy.min_delay_ms))
                    .with_max_delay(Duration::from_millis(policy.max_delay_ms))
                    .with_factor(policy.factor),
            )
            .when(RavenError::is_retryable)
            .notify(|err, dur| {
                warn!(error = %err, retry_in = ?dur, model = self.llm.model_name(), "Generation failed, retrying");
            })
            .await
    }

    /// Append one emoji picked by the state's mood, with the configured probability.
    fn decorate(&self, text: String, state: &EmotionalState) -> String {
        let mut rng = rand::thread_rng();
        let p = self.config.emoji_probability.clamp(0.0, 1.0);
        if !rng.gen_bool(p) {
            return text;
        }
        match state.mood().emojis().choose(&mut rng) {
            Some(emoji) => format!("{} {}", text, emoji),
            None => text,
        }
    }
}
