//! Integration tests for the conversation pipeline over a real SQLite store.

use async_trait::async_trait;
use raven_core::{
    ConversationConfig, Conversation, EmotionalState, GenerationOptions, Inbound, Llm,
    LlmResponse, MemoryStore, Message, MessageRole, Mode, RavenError, RavenResult, RetryPolicy,
    SqliteStore, StateStore, TriggerCategory,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const EPS: f64 = 1e-9;

/// Plays back scripted results, then keeps answering with a fixed reply.
struct ScriptedLlm {
    script: Mutex<VecDeque<Result<String, String>>>,
    fallback: String,
    calls: AtomicUsize,
}

impl ScriptedLlm {
    fn replying(text: &str) -> Self {
        Self::scripted(Vec::new(), text)
    }

    fn scripted(script: Vec<Result<&str, &str>>, fallback: &str) -> Self {
        Self {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|r| r.map(String::from).map_err(String::from))
                    .collect(),
            ),
            fallback: fallback.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self::scripted(vec![Err("down"); 16], "unused")
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Llm for ScriptedLlm {
    async fn generate(
        &self,
        _messages: &[Message],
        _options: Option<GenerationOptions>,
    ) -> RavenResult<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(LlmResponse::text(text)),
            Some(Err(message)) => Err(RavenError::llm(message)),
            None => Ok(LlmResponse::text(self.fallback.clone())),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn quiet() -> ConversationConfig {
    ConversationConfig {
        emoji_probability: 0.0,
        thinking_delay: false,
        ..Default::default()
    }
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        min_delay_ms: 1,
        max_delay_ms: 4,
        factor: 2.0,
    }
}

fn conversation(store: &SqliteStore, llm: Arc<ScriptedLlm>) -> Conversation {
    Conversation::new(Arc::new(store.clone()), Arc::new(store.clone()), llm)
        .with_conversation_config(quiet())
        .with_retry(fast_retry())
}

#[tokio::test]
async fn test_affection_turn() {
    let store = SqliteStore::in_memory().unwrap();
    let conv = conversation(&store, Arc::new(ScriptedLlm::replying("я тут")));

    let outcome = conv
        .handle_in_mode(Inbound::text("скучаю, обними"), Mode::Care)
        .await
        .unwrap();

    let state = store.get_state().unwrap();
    assert!((state.love - 0.95).abs() < EPS);
    assert!((state.care - 0.60).abs() < EPS);
    assert!((state.jealousy - 0.20).abs() < EPS);
    assert!((state.anger - 0.20).abs() < EPS);
    assert_eq!(outcome.state, state);
    assert_eq!(outcome.triggered, vec![TriggerCategory::Affection]);

    assert_eq!(store.fact_count().unwrap(), 0);
    let rows = store.recent_messages(10).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].role, MessageRole::User);
    assert_eq!(rows[0].content, "скучаю, обними");
}

#[tokio::test]
async fn test_distress_turn_extracts_facts() {
    let store = SqliteStore::in_memory().unwrap();
    let conv = conversation(&store, Arc::new(ScriptedLlm::replying("выпей воды")));
    let text = "голова болит, включи плейлист";

    conv.handle_in_mode(Inbound::text(text), Mode::Neutral)
        .await
        .unwrap();

    let state = store.get_state().unwrap();
    assert!((state.care - 0.70).abs() < EPS);
    assert!((state.anger - 0.10).abs() < EPS);

    let facts = store.recent_facts(10).unwrap();
    let mut keys: Vec<_> = facts.iter().map(|f| f.key.as_str()).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["health", "music_hint"]);
    assert!(facts.iter().all(|f| f.value == text));
}

#[tokio::test]
async fn test_most_recent_fact_first() {
    let store = SqliteStore::in_memory().unwrap();
    store.add_fact("a", "1").unwrap();
    store.add_fact("b", "2").unwrap();
    assert_eq!(store.recent_facts_text(1).unwrap(), "b: 2");
}

#[tokio::test]
async fn test_generation_failure_keeps_state_and_facts() {
    let store = SqliteStore::in_memory().unwrap();
    let llm = Arc::new(ScriptedLlm::failing());
    let conv = conversation(&store, llm.clone());

    let err = conv
        .handle_in_mode(Inbound::text("мне страшно, не звони"), Mode::Psych)
        .await
        .unwrap_err();
    assert!(matches!(err, RavenError::Llm { .. }));
    assert_eq!(llm.calls(), 3);

    let state = store.get_state().unwrap();
    assert!((state.care - 0.70).abs() < EPS);
    assert_eq!(store.fact_count().unwrap(), 1);

    let rows = store.recent_messages(10).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].role, MessageRole::User);
}

#[tokio::test]
async fn test_transient_generation_failure_is_retried() {
    let store = SqliteStore::in_memory().unwrap();
    let llm = Arc::new(ScriptedLlm::scripted(
        vec![Err("timeout"), Ok("   "), Ok("вернулся")],
        "unused",
    ));
    let conv = conversation(&store, llm.clone());

    let reply = conv
        .handle_in_mode(Inbound::text("ты где?"), Mode::Neutral)
        .await
        .unwrap()
        .reply;
    assert_eq!(reply, "вернулся");
    assert_eq!(llm.calls(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_turns_do_not_lose_deltas() {
    let store = SqliteStore::in_memory().unwrap();
    store
        .set_state(&EmotionalState::new(0.5, 0.0, 0.5, 0.0))
        .unwrap();
    let conv = Arc::new(conversation(&store, Arc::new(ScriptedLlm::replying("хм"))));

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let conv = conv.clone();
            tokio::spawn(async move {
                conv.handle_in_mode(Inbound::text(format!("был в клубе #{}", i)), Mode::Psych)
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let state = store.get_state().unwrap();
    assert!((state.jealousy - 0.75).abs() < EPS);
    assert!((state.care - 0.25).abs() < EPS);
    assert_eq!(store.message_count().unwrap(), 10);
}

#[tokio::test]
async fn test_state_and_memory_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("raven.sqlite");

    {
        let store = SqliteStore::new(&path).unwrap();
        let conv = conversation(&store, Arc::new(ScriptedLlm::replying("держу")));
        conv.handle_in_mode(Inbound::text("люблю, обними"), Mode::Care)
            .await
            .unwrap();
        conv.remember_command("чай=без сахара").unwrap();
    }

    let reopened = SqliteStore::new(&path).unwrap();
    let state = reopened.get_state().unwrap();
    assert!((state.love - 0.95).abs() < EPS);
    assert_eq!(reopened.recent_facts_text(1).unwrap(), "чай: без сахара");
    assert_eq!(reopened.message_count().unwrap(), 2);
}

#[tokio::test]
async fn test_start_marker_stays_out_of_the_prompt() {
    let store = SqliteStore::in_memory().unwrap();
    let conv = conversation(&store, Arc::new(ScriptedLlm::replying("здесь")));

    conv.log_system("/start").unwrap();
    conv.handle_in_mode(Inbound::text("привет"), Mode::Care)
        .await
        .unwrap();

    let roles: Vec<_> = store
        .recent_messages(10)
        .unwrap()
        .into_iter()
        .map(|m| m.role)
        .collect();
    assert_eq!(
        roles,
        vec![MessageRole::System, MessageRole::User, MessageRole::Assistant]
    );
}
