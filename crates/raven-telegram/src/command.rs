//! Bot commands and their fixed replies.

pub const START_REPLY: &str = "Я здесь. Не теряй меня.";
pub const REMEMBER_USAGE: &str = "Используй: /remember ключ=значение или /remember Запомни: ...";
pub const REMEMBER_REPLY: &str = "Запомнил. Теперь это со мной.";

/// Dialog row written by `/start`.
pub const START_MARKER: &str = "/start";

/// A recognised slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    WhoAmI,
    /// Argument after the command, trimmed; empty when none was given.
    Remember(String),
}

impl Command {
    /// Parse `/name[@bot] [args]`. Unknown commands and plain text yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim_start();
        let rest = text.strip_prefix('/')?;

        let (head, arg) = match rest.split_once(char::is_whitespace) {
            Some((head, arg)) => (head, arg.trim()),
            None => (rest, ""),
        };
        let name = head.split('@').next().unwrap_or(head);

        match name.to_lowercase().as_str() {
            "start" => Some(Command::Start),
            "whoami" => Some(Command::WhoAmI),
            "remember" => Some(Command::Remember(arg.to_string())),
            _ => None,
        }
    }

    /// Whether `text` looks like a slash command at all.
    pub fn is_command(text: &str) -> bool {
        text.trim_start().starts_with('/')
    }
}

pub fn whoami_reply(chat_id: i64) -> String {
    format!("chat_id: {}", chat_id)
}
