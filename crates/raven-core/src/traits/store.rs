//! Storage traits for the relationship state and the two logs.

use crate::error::RavenResult;
use crate::types::{DialogMessage, EmotionalState, Fact, MessageRole};

/// Returned by [`MemoryStore::recent_facts_text`] when no fact exists yet.
pub const NO_MEMORY_PLACEHOLDER: &str = "—";

/// Persistent home of the single emotional state.
pub trait StateStore: Send + Sync {
    /// Read the current state.
    fn get_state(&self) -> RavenResult<EmotionalState>;

    /// Clamp, stamp `updated_at` and persist. Returns what was written.
    fn set_state(&self, state: &EmotionalState) -> RavenResult<EmotionalState>;
}

/// Append-only fact and dialog logs.
pub trait MemoryStore: Send + Sync {
    /// Append a dialog row. Returns its id.
    fn log_message(&self, role: MessageRole, content: &str) -> RavenResult<i64>;

    /// Last `n` dialog rows, oldest first.
    fn recent_messages(&self, n: usize) -> RavenResult<Vec<DialogMessage>>;

    /// Append a fact. Never deduplicates or overwrites.
    fn add_fact(&self, key: &str, value: &str) -> RavenResult<i64>;

    /// Up to `limit` facts, most recent first.
    fn recent_facts(&self, limit: usize) -> RavenResult<Vec<Fact>>;

    /// Up to `limit` facts rendered as `key: value` lines, most recent first,
    /// or [`NO_MEMORY_PLACEHOLDER`] when there are none.
    fn recent_facts_text(&self, limit: usize) -> RavenResult<String> {
        let facts = self.recent_facts(limit)?;
        if facts.is_empty() {
            return Ok(NO_MEMORY_PLACEHOLDER.to_string());
        }
        Ok(facts
            .iter()
            .map(|f| f.render())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
