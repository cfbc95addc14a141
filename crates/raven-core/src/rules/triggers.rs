//! Keyword triggers that move the emotional state.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::KeywordSet;
use crate::types::{EmotionalState, StateDelta};

/// Signal categories recognised in inbound text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TriggerCategory {
    Affection,
    Distress,
    RivalAttention,
    Hostility,
}

/// One row of the trigger table.
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerRule {
    pub category: TriggerCategory,
    pub keywords: KeywordSet,
    pub delta: StateDelta,
}

impl TriggerRule {
    pub fn new<I, S>(category: TriggerCategory, keywords: I, delta: StateDelta) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            category,
            keywords: KeywordSet::new(keywords),
            delta,
        }
    }
}

/// A category that fired, with the keyword that fired it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerMatch {
    pub category: TriggerCategory,
    pub matched_keyword: String,
}

/// Everything one piece of text triggered.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriggerOutcome {
    pub matches: Vec<TriggerMatch>,
    /// Sum of the deltas of every matched rule.
    pub delta: StateDelta,
}

impl TriggerOutcome {
    pub fn categories(&self) -> Vec<TriggerCategory> {
        self.matches.iter().map(|m| m.category).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}

/// The built-in trigger table.
pub fn default_trigger_rules() -> Vec<TriggerRule> {
    vec![
        TriggerRule::new(
            TriggerCategory::Affection,
            [
                "люблю",
                "скучаю",
                "обними",
                "рядом будь",
                "нужен",
                "love you",
                "miss you",
                "hold me",
                "need you",
            ],
            StateDelta::new(0.10, 0.0, 0.10, 0.0),
        ),
        TriggerRule::new(
            TriggerCategory::Distress,
            [
                "болит", "плохо", "устала", "паника", "страшно", "hurts", "bad", "tired", "panic",
                "scared",
            ],
            StateDelta::new(0.0, 0.0, 0.20, -0.10),
        ),
        TriggerRule::new(
            TriggerCategory::RivalAttention,
            [
                "парень",
                "клуб",
                "другой",
                "познакомился",
                "подвез",
                "танцпол",
                "boyfriend",
                "club",
                "someone else",
                "met someone",
                "gave a ride",
                "dance floor",
            ],
            StateDelta::new(0.0, 0.15, -0.05, 0.0),
        ),
        TriggerRule::new(
            TriggerCategory::Hostility,
            [
                "ненавижу",
                "отвали",
                "ушёл",
                "игнор",
                "пошёл",
                "hate",
                "get lost",
                "left",
                "ignoring",
                "go away",
            ],
            StateDelta::new(-0.05, 0.0, 0.0, 0.15),
        ),
    ]
}

/// Pure text → state transition.
#[derive(Debug, Clone)]
pub struct TriggerEngine {
    rules: Vec<TriggerRule>,
}

impl Default for TriggerEngine {
    fn default() -> Self {
        Self::new(default_trigger_rules())
    }
}

impl TriggerEngine {
    pub fn new(rules: Vec<TriggerRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[TriggerRule] {
        &self.rules
    }

    /// Every rule that fires on `text` and their summed delta.
    pub fn evaluate(&self, text: &str) -> TriggerOutcome {
        let lowered = text.to_lowercase();
        let mut outcome = TriggerOutcome::default();

        for rule in &self.rules {
            if let Some(keyword) = rule.keywords.first_match(&lowered) {
                outcome.matches.push(TriggerMatch {
                    category: rule.category,
                    matched_keyword: keyword.to_string(),
                });
                outcome.delta = outcome.delta.combine(&rule.delta);
            }
        }

        outcome
    }

    /// Apply every matching rule to `state`, clamping once at the end.
    pub fn apply(&self, text: &str, state: EmotionalState) -> EmotionalState {
        state.apply_delta(&self.evaluate(text).delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    #[test]
    fn test_affection_raises_love_and_care() {
        let engine = TriggerEngine::default();
        let next = engine.apply("скучаю, обними", EmotionalState::default());
        assert!(approx(next.love, 0.95));
        assert!(approx(next.care, 0.60));
        assert!(approx(next.jealousy, 0.20));
        assert!(approx(next.anger, 0.20));
    }

    #[test]
    fn test_one_category_fires_once_per_text() {
        // two affection keywords still apply the affection delta once
        let engine = TriggerEngine::default();
        let outcome = engine.evaluate("люблю, скучаю, обними");
        assert_eq!(outcome.categories(), vec![TriggerCategory::Affection]);
        assert!(approx(outcome.delta.love, 0.10));
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let engine = TriggerEngine::default();
        let outcome = engine.evaluate("Я ТЕБЯ ЛЮБЛЮ");
        assert_eq!(outcome.categories(), vec![TriggerCategory::Affection]);
        assert_eq!(outcome.matches[0].matched_keyword, "люблю");
    }

    #[test]
    fn test_multiple_categories_sum() {
        let engine = TriggerEngine::default();
        let outcome = engine.evaluate("мне плохо, а парень ушёл");
        assert_eq!(
            outcome.categories(),
            vec![
                TriggerCategory::Distress,
                TriggerCategory::RivalAttention,
                TriggerCategory::Hostility
            ]
        );

        let next = engine.apply("мне плохо, а парень ушёл", EmotionalState::default());
        assert!(approx(next.love, 0.80));
        assert!(approx(next.jealousy, 0.35));
        assert!(approx(next.care, 0.65));
        assert!(approx(next.anger, 0.25));
    }

    #[test]
    fn test_english_keywords() {
        let engine = TriggerEngine::default();
        let outcome = engine.evaluate("I met someone at the club");
        assert_eq!(outcome.categories(), vec![TriggerCategory::RivalAttention]);
    }

    #[test]
    fn test_no_match_leaves_state_untouched() {
        let engine = TriggerEngine::default();
        let state = EmotionalState::default();
        let outcome = engine.evaluate("как прошёл день?");
        assert!(outcome.is_empty());
        assert!(outcome.delta.is_zero());
        assert_eq!(engine.apply("как прошёл день?", state), state);
    }

    #[test]
    fn test_apply_is_deterministic() {
        let engine = TriggerEngine::default();
        let state = EmotionalState::new(0.4, 0.7, 0.3, 0.9);
        let text = "ненавижу этот клуб, мне страшно";
        assert_eq!(engine.apply(text, state), engine.apply(text, state));
    }

    #[test]
    fn test_clamp_holds_over_any_sequence() {
        let engine = TriggerEngine::default();
        let texts = [
            "люблю",
            "ненавижу",
            "парень из клуба",
            "болит",
            "отвали, я устала",
            "обними",
            "",
        ];

        let mut state = EmotionalState::default();
        for round in 0..50 {
            let text = texts[(round * 7 + 3) % texts.len()];
            state = engine.apply(text, state);
            for value in [state.love, state.jealousy, state.care, state.anger] {
                assert!((0.0..=1.0).contains(&value), "{} escaped [0,1]", value);
            }
        }
    }

    #[test]
    fn test_saturation_at_upper_bound() {
        let engine = TriggerEngine::default();
        let mut state = EmotionalState::default();
        for _ in 0..20 {
            state = engine.apply("ревную, он из клуба", state);
        }
        assert_eq!(state.jealousy, 1.0);
        assert_eq!(state.care, 0.0);
    }

    #[test]
    fn test_custom_rules() {
        let engine = TriggerEngine::new(vec![TriggerRule::new(
            TriggerCategory::Affection,
            ["purr"],
            StateDelta::new(0.5, 0.0, 0.0, 0.0),
        )]);
        let next = engine.apply("PURR", EmotionalState::new(0.2, 0.0, 0.0, 0.0));
        assert!(approx(next.love, 0.7));
    }
}
