//! Wiring of the store, the generation provider and the outreach from configuration.

use std::sync::Arc;
use std::time::Duration;

use raven_core::config::RavenConfig;
use raven_core::error::RavenResult;
use raven_core::outreach::{Outreach, WebhookOutbox};
use raven_core::traits::Llm;
use raven_core::{Conversation, SqliteStore};
use raven_llm::LlmFactory;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Open the database and build the conversation.
pub fn create_conversation(config: &RavenConfig) -> RavenResult<Arc<Conversation>> {
    let llm = LlmFactory::from_config(&config.llm)?;
    create_conversation_with_llm(config, llm)
}

/// Same as [`create_conversation`] with an already built provider.
pub fn create_conversation_with_llm(
    config: &RavenConfig,
    llm: Arc<dyn Llm>,
) -> RavenResult<Arc<Conversation>> {
    let store = Arc::new(SqliteStore::new(&config.db_path)?);
    tracing::info!(path = %config.db_path.display(), "Opened memory store");
    Ok(Arc::new(Conversation::from_config(
        config,
        store.clone(),
        store,
        llm,
    )))
}

/// Outreach over a signed webhook, or `None` without a webhook URL.
pub fn create_outreach(
    config: &RavenConfig,
    conversation: Arc<Conversation>,
) -> RavenResult<Option<Outreach>> {
    let Some(url) = config.outreach.webhook_url.clone() else {
        return Ok(None);
    };
    let outbox = WebhookOutbox::new(config.outreach.webhook_secret.clone(), WEBHOOK_TIMEOUT)?;
    Ok(Some(Outreach::new(conversation, Arc::new(outbox), Some(url))))
}
