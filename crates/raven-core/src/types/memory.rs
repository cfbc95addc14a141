//! Rows of the two append-only logs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::message::{Message, MessageRole};

/// A remembered fact. Keys may repeat; recall is most-recent-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub id: i64,
    pub key: String,
    pub value: String,
    pub created_at: DateTime<Utc>,
}

impl Fact {
    /// `key: value`
    pub fn render(&self) -> String {
        format!("{}: {}", self.key, self.value)
    }
}

/// One row of the dialog log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogMessage {
    pub id: i64,
    pub role: MessageRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl From<DialogMessage> for Message {
    fn from(row: DialogMessage) -> Self {
        Message::new(row.role, row.content)
    }
}
