//! Automatic fact extraction from inbound text.

use serde::{Deserialize, Serialize};

use super::KeywordSet;

pub const MUSIC_HINT_KEY: &str = "music_hint";
pub const HEALTH_KEY: &str = "health";
pub const BOUNDARY_KEY: &str = "bound";

/// One row of the extraction table: a fact key and the keywords that file it.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRule {
    pub key: String,
    pub keywords: KeywordSet,
}

impl ExtractionRule {
    pub fn new<I, S>(key: impl Into<String>, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            key: key.into(),
            keywords: KeywordSet::new(keywords),
        }
    }
}

/// A fact ready to be appended to the memory store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFact {
    pub key: String,
    pub value: String,
}

/// The built-in extraction table.
pub fn default_extraction_rules() -> Vec<ExtractionRule> {
    vec![
        ExtractionRule::new(
            MUSIC_HINT_KEY,
            [
                "трек", "песня", "музыка", "плейлист", "track", "song", "music", "playlist",
            ],
        ),
        ExtractionRule::new(
            HEALTH_KEY,
            [
                "болит", "устала", "спать", "голова", "паника", "hurts", "tired", "sleep",
                "headache", "panic",
            ],
        ),
        ExtractionRule::new(
            BOUNDARY_KEY,
            [
                "не звони",
                "пиши",
                "ненавижу игнор",
                "люби меня",
                "без драм",
                "don't call",
                "text me",
                "no drama",
                "love me",
            ],
        ),
    ]
}

/// Files the raw text under every key whose keywords it contains.
#[derive(Debug, Clone)]
pub struct FactExtractor {
    rules: Vec<ExtractionRule>,
}

impl Default for FactExtractor {
    fn default() -> Self {
        Self::new(default_extraction_rules())
    }
}

impl FactExtractor {
    pub fn new(rules: Vec<ExtractionRule>) -> Self {
        Self { rules }
    }

    /// Zero or more facts, in table order. The value is always `text` as given.
    pub fn extract(&self, text: &str) -> Vec<ExtractedFact> {
        let lowered = text.to_lowercase();
        self.rules
            .iter()
            .filter(|rule| rule.keywords.matches(&lowered))
            .map(|rule| ExtractedFact {
                key: rule.key.clone(),
                value: text.to_string(),
            })
            .collect()
    }
}
