//! Route definitions for the REST API.

mod facts;
mod health;
mod history;
mod messages;
mod outreach;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Turns
        .route("/messages", post(messages::send_message))
        // Memory
        .route("/facts", post(facts::add_fact))
        .route("/facts", get(facts::list_facts))
        .route("/history", get(history::list_history))
        .route("/state", get(history::get_state))
        // Proactive outreach
        .route("/outreach", post(outreach::trigger_outreach))
        // Attach state
        .with_state(state)
}

pub use facts::*;
pub use health::*;
pub use history::*;
pub use messages::*;
pub use outreach::*;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use raven_core::config::ConversationConfig;
    use raven_core::error::RavenResult;
    use raven_core::traits::{GenerationOptions, Llm, LlmResponse};
    use raven_core::types::Message;
    use raven_core::{Conversation, SqliteStore};
    use tower::ServiceExt;

    use crate::state::AppState;

    /// Replies with a fixed text, or fails every call when `reply` is `None`.
    pub struct FixedLlm {
        pub reply: Option<&'static str>,
    }

    #[async_trait]
    impl Llm for FixedLlm {
        async fn generate(
            &self,
            _messages: &[Message],
            _options: Option<GenerationOptions>,
        ) -> RavenResult<LlmResponse> {
            match self.reply {
                Some(text) => Ok(LlmResponse {
                    content: Some(text.to_string()),
                    usage: None,
                }),
                None => Err(raven_core::RavenError::llm("upstream down")),
            }
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    pub fn conversation(reply: Option<&'static str>) -> Arc<Conversation> {
        let store = Arc::new(SqliteStore::in_memory().unwrap());
        Arc::new(
            Conversation::new(store.clone(), store, Arc::new(FixedLlm { reply }))
                .with_conversation_config(ConversationConfig {
                    emoji_probability: 0.0,
                    thinking_delay: false,
                    ..Default::default()
                })
                .with_retry(raven_core::config::RetryPolicy::none()),
        )
    }

    pub fn app(reply: Option<&'static str>) -> Router {
        super::create_router(AppState::new(conversation(reply)))
    }

    pub async fn call(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}
