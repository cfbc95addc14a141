//! Proactive outreach.
//!
//! A timer-driven message that shares only prompt assembly and generation with
//! the turn pipeline: nothing is logged, no trigger fires, no fact is stored.
//! Delivery failures are logged and swallowed so the next run is unaffected.

mod scheduler;
mod webhook;

pub use scheduler::OutreachScheduler;
pub use webhook::{verify_signature, WebhookOutbox, SIGNATURE_HEADER};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::conversation::Conversation;
use crate::traits::Outbox;
use crate::types::Mode;

/// Result of one outreach run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutreachResult {
    /// Text was generated and handed to the outbox.
    Delivered {
        destination: String,
        text: String,
        at: DateTime<Utc>,
    },
    /// Nothing was attempted (no destination).
    Skipped { reason: String },
    /// Generation or delivery failed.
    Failed { error: String },
}

impl OutreachResult {
    pub fn is_delivered(&self) -> bool {
        matches!(self, OutreachResult::Delivered { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, OutreachResult::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, OutreachResult::Failed { .. })
    }
}

/// Generates the outreach text and hands it to an [`Outbox`].
#[derive(Clone)]
pub struct Outreach {
    conversation: Arc<Conversation>,
    outbox: Arc<dyn Outbox>,
    destination: Option<String>,
}

impl Outreach {
    pub fn new(
        conversation: Arc<Conversation>,
        outbox: Arc<dyn Outbox>,
        destination: Option<String>,
    ) -> Self {
        Self {
            conversation,
            outbox,
            destination: destination.filter(|d| !d.trim().is_empty()),
        }
    }

    pub fn destination(&self) -> Option<&str> {
        self.destination.as_deref()
    }

    /// Run once in the current local mode.
    pub async fn run_once(&self) -> OutreachResult {
        self.run_once_in_mode(Mode::now()).await
    }

    /// Run once in a fixed mode. Never returns an error.
    pub async fn run_once_in_mode(&self, mode: Mode) -> OutreachResult {
        let Some(destination) = self.destination.clone() else {
            return OutreachResult::Skipped {
                reason: "no destination configured".to_string(),
            };
        };

        let text = match self.conversation.compose_outreach_in_mode(mode).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Outreach generation failed");
                return OutreachResult::Failed {
                    error: e.to_string(),
                };
            }
        };

        match self.outbox.deliver(&destination, &text).await {
            Ok(()) => {
                info!(destination = %destination, "Outreach delivered");
                OutreachResult::Delivered {
                    destination,
                    text,
                    at: Utc::now(),
                }
            }
            Err(e) => {
                warn!(destination = %destination, error = %e, "Outreach delivery failed");
                OutreachResult::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConversationConfig, RetryPolicy};
    use crate::error::{RavenError, RavenResult};
    use crate::store::SqliteStore;
    use crate::traits::{GenerationOptions, Llm, LlmResponse, MockOutbox};
    use crate::types::Message;
    use async_trait::async_trait;
    use mockall::predicate::eq;

    struct FixedLlm(Option<&'static str>);

    #[async_trait]
    impl Llm for FixedLlm {
        async fn generate(
            &self,
            _messages: &[Message],
            _options: Option<GenerationOptions>,
        ) -> RavenResult<LlmResponse> {
            match self.0 {
                Some(text) => Ok(LlmResponse::text(text)),
                None => Err(RavenError::llm("offline")),
            }
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    fn conversation(llm: FixedLlm) -> (Arc<Conversation>, SqliteStore) {
        let store = SqliteStore::in_memory().unwrap();
        let conv = Conversation::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(llm),
        )
        .with_conversation_config(ConversationConfig {
            emoji_probability: 0.0,
            thinking_delay: false,
            ..Default::default()
        })
        .with_retry(RetryPolicy::none());
        (Arc::new(conv), store)
    }

    #[tokio::test]
    async fn test_no_destination_is_a_noop() {
        let (conv, _store) = conversation(FixedLlm(Some("скучаю")));
        let mut outbox = MockOutbox::new();
        outbox.expect_deliver().never();

        let outreach = Outreach::new(conv, Arc::new(outbox), None);
        assert!(outreach.run_once_in_mode(Mode::Psych).await.is_skipped());

        let (conv, _store) = conversation(FixedLlm(Some("скучаю")));
        let mut outbox = MockOutbox::new();
        outbox.expect_deliver().never();
        let outreach = Outreach::new(conv, Arc::new(outbox), Some("  ".to_string()));
        assert!(outreach.run_once_in_mode(Mode::Psych).await.is_skipped());
    }

    #[tokio::test]
    async fn test_delivers_generated_text() {
        let (conv, store) = conversation(FixedLlm(Some("скучаю. ревную. береги себя.")));
        let mut outbox = MockOutbox::new();
        outbox
            .expect_deliver()
            .with(eq("42"), eq("скучаю. ревную. береги себя."))
            .times(1)
            .returning(|_, _| Ok(()));

        let outreach = Outreach::new(conv, Arc::new(outbox), Some("42".to_string()));
        let result = outreach.run_once_in_mode(Mode::Psych).await;
        assert!(result.is_delivered());
        assert_eq!(store.message_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let (conv, _store) = conversation(FixedLlm(Some("скучаю")));
        let mut outbox = MockOutbox::new();
        outbox
            .expect_deliver()
            .times(2)
            .returning(|_, _| Err(RavenError::delivery("chat not found")));

        let outreach = Outreach::new(conv, Arc::new(outbox), Some("42".to_string()));
        assert!(outreach.run_once_in_mode(Mode::Care).await.is_failed());
        // the next run is attempted again as usual
        assert!(outreach.run_once_in_mode(Mode::Care).await.is_failed());
    }

    #[tokio::test]
    async fn test_generation_failure_skips_delivery() {
        let (conv, _store) = conversation(FixedLlm(None));
        let mut outbox = MockOutbox::new();
        outbox.expect_deliver().never();

        let outreach = Outreach::new(conv, Arc::new(outbox), Some("42".to_string()));
        let result = outreach.run_once_in_mode(Mode::Neutral).await;
        assert!(matches!(result, OutreachResult::Failed { error } if error.contains("offline")));
    }

    #[test]
    fn test_result_serializes_with_status_tag() {
        let json = serde_json::to_string(&OutreachResult::Skipped {
            reason: "no destination configured".to_string(),
        })
        .unwrap();
        assert!(json.contains(r#""status":"skipped""#));
    }
}
