//! raven-telegram - Telegram bot binary.

use std::sync::Arc;

use anyhow::Context;
use raven_core::outreach::Outreach;
use raven_core::traits::TextToSpeech;
use raven_core::{Conversation, OutreachScheduler, RavenConfig, SqliteStore};
use raven_llm::LlmFactory;
use raven_telegram::{RavenBot, TelegramConfig, TelegramOutbox};
use teloxide::prelude::*;
use teloxide::types::Message as TelegramMessage;
use tracing::{error, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// File given by `RAVEN_CONFIG` (if any), then environment overrides.
fn load_config() -> anyhow::Result<RavenConfig> {
    let mut config = match std::env::var("RAVEN_CONFIG") {
        Ok(path) if !path.trim().is_empty() => RavenConfig::from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        _ => RavenConfig::default(),
    };
    config.apply_env();
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::from_default_env()
                .add_directive(Level::INFO.into())
                .add_directive("raven_telegram=debug".parse()?),
        )
        .init();

    let telegram = TelegramConfig::from_env()?;
    let config = load_config()?;

    let llm = LlmFactory::from_config(&config.llm)?;
    let store = Arc::new(SqliteStore::new(&config.db_path)?);
    let conversation = Arc::new(Conversation::from_config(
        &config,
        store.clone(),
        store,
        llm,
    ));

    let mut handler = RavenBot::new(conversation.clone());
    let mut tts: Option<Arc<dyn TextToSpeech>> = None;
    match LlmFactory::speech(&config) {
        Ok(speech) => {
            if config.speech.voice_replies {
                tts = Some(speech.clone() as Arc<dyn TextToSpeech>);
            }
            handler = handler.with_speech(speech, tts.clone());
            info!(voice_replies = config.speech.voice_replies, "Voice support enabled");
        }
        Err(e) => warn!(error = %e, "Voice support disabled"),
    }

    let bot = Bot::new(&telegram.token);
    let me = bot.get_me().await.context("Failed to get bot info")?;
    info!(
        "Telegram bot started: @{} (ID: {})",
        me.username.as_deref().unwrap_or("unknown"),
        me.id.0
    );

    let mut scheduler = None;
    match (&config.outreach.chat_id, config.outreach.enabled) {
        (Some(chat_id), true) => {
            let outbox = TelegramOutbox::new(bot.clone(), tts);
            let outreach = Outreach::new(conversation, Arc::new(outbox), Some(chat_id.clone()));
            let mut job = OutreachScheduler::new(outreach, config.outreach.cron.clone()).await?;
            job.start().await?;
            info!(cron = %job.cron(), "Outreach scheduler started");
            scheduler = Some(job);
        }
        (None, true) => info!("RAVEN_OUTREACH_CHAT_ID is not set; outreach disabled"),
        _ => {}
    }

    let handler = Arc::new(handler);
    let update_handler = Update::filter_message().endpoint(move |bot: Bot, msg: TelegramMessage| {
        let handler = handler.clone();
        async move {
            if let Err(e) = handler.handle_message(bot, msg).await {
                error!(error = %e, code = e.code().as_str(), "Failed to handle message");
            }
            Ok::<(), std::convert::Infallible>(())
        }
    });

    Dispatcher::builder(bot, update_handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    if let Some(mut job) = scheduler {
        job.shutdown().await?;
    }

    info!("Bot stopped cleanly");
    Ok(())
}
