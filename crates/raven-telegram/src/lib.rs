//! raven-telegram - Telegram transport for raven.
//!
//! Commands (`/start`, `/whoami`, `/remember`), text and voice turns, and an
//! [`Outbox`](raven_core::traits::Outbox) for the nightly outreach.

pub mod command;
pub mod handler;
pub mod outbox;

pub use command::Command;
pub use handler::RavenBot;
pub use outbox::TelegramOutbox;

use raven_core::error::{RavenError, RavenResult};

/// Bot token variables, in lookup order.
pub const TOKEN_VARS: [&str; 2] = ["TELEGRAM_BOT_TOKEN", "TELEGRAM_TOKEN"];

/// Telegram transport settings.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub token: String,
}

impl TelegramConfig {
    /// Read the token from the environment.
    pub fn from_env() -> RavenResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> RavenResult<Self> {
        TOKEN_VARS
            .iter()
            .find_map(|name| lookup(name).filter(|v| !v.trim().is_empty()))
            .map(|token| Self { token })
            .ok_or_else(|| RavenError::missing_credential("TELEGRAM_BOT_TOKEN"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_falls_back_to_short_name() {
        let config = TelegramConfig::from_lookup(|name| {
            (name == "TELEGRAM_TOKEN").then(|| "123:abc".to_string())
        })
        .unwrap();
        assert_eq!(config.token, "123:abc");
    }

    #[test]
    fn test_primary_token_wins() {
        let config = TelegramConfig::from_lookup(|name| Some(format!("{}-value", name))).unwrap();
        assert_eq!(config.token, "TELEGRAM_BOT_TOKEN-value");
    }

    #[test]
    fn test_missing_token_is_a_configuration_error() {
        let err = TelegramConfig::from_lookup(|_| Some("  ".to_string())).unwrap_err();
        assert!(matches!(err, RavenError::Configuration(_)));
    }
}
