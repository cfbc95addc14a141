//! The emotional state vector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::mode::Mode;

/// Initial values written on first run.
pub const INITIAL_LOVE: f64 = 0.85;
pub const INITIAL_JEALOUSY: f64 = 0.20;
pub const INITIAL_CARE: f64 = 0.50;
pub const INITIAL_ANGER: f64 = 0.20;

/// Above this `care` level replies lean on the care emoji set.
pub const CARE_MOOD_THRESHOLD: f64 = 0.6;
/// Above this `jealousy + anger` sum replies lean on the psych emoji set.
pub const PSYCH_MOOD_THRESHOLD: f64 = 1.0;

/// Clamp a value into `[0, 1]`.
pub fn clamp_unit(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// The single relationship state.
///
/// Every constructor and mutation keeps all four dimensions inside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionalState {
    pub love: f64,
    pub jealousy: f64,
    pub care: f64,
    pub anger: f64,
    pub updated_at: DateTime<Utc>,
}

impl Default for EmotionalState {
    fn default() -> Self {
        Self {
            love: INITIAL_LOVE,
            jealousy: INITIAL_JEALOUSY,
            care: INITIAL_CARE,
            anger: INITIAL_ANGER,
            updated_at: Utc::now(),
        }
    }
}

impl EmotionalState {
    /// Create a state from raw values, clamping each one.
    pub fn new(love: f64, jealousy: f64, care: f64, anger: f64) -> Self {
        Self {
            love,
            jealousy,
            care,
            anger,
            updated_at: Utc::now(),
        }
        .clamped()
    }

    /// Return a copy with every dimension clamped to `[0, 1]`.
    pub fn clamped(self) -> Self {
        Self {
            love: clamp_unit(self.love),
            jealousy: clamp_unit(self.jealousy),
            care: clamp_unit(self.care),
            anger: clamp_unit(self.anger),
            updated_at: self.updated_at,
        }
    }

    /// Add a delta to every dimension, then clamp once.
    pub fn apply_delta(self, delta: &StateDelta) -> Self {
        Self {
            love: self.love + delta.love,
            jealousy: self.jealousy + delta.jealousy,
            care: self.care + delta.care,
            anger: self.anger + delta.anger,
            updated_at: self.updated_at,
        }
        .clamped()
    }

    /// Emoji register implied by the current state.
    pub fn mood(&self) -> Mode {
        if self.care > CARE_MOOD_THRESHOLD {
            Mode::Care
        } else if self.jealousy + self.anger > PSYCH_MOOD_THRESHOLD {
            Mode::Psych
        } else {
            Mode::Neutral
        }
    }

    /// `LOVE=0.85; JEALOUSY=0.20; CARE=0.50; ANGER=0.20`
    pub fn summary(&self) -> String {
        format!(
            "LOVE={:.2}; JEALOUSY={:.2}; CARE={:.2}; ANGER={:.2}",
            self.love, self.jealousy, self.care, self.anger
        )
    }
}

/// A signed change to the four dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct StateDelta {
    pub love: f64,
    pub jealousy: f64,
    pub care: f64,
    pub anger: f64,
}

impl StateDelta {
    pub const ZERO: StateDelta = StateDelta {
        love: 0.0,
        jealousy: 0.0,
        care: 0.0,
        anger: 0.0,
    };

    pub const fn new(love: f64, jealousy: f64, care: f64, anger: f64) -> Self {
        Self {
            love,
            jealousy,
            care,
            anger,
        }
    }

    /// Component-wise sum.
    pub fn combine(self, other: &StateDelta) -> Self {
        Self {
            love: self.love + other.love,
            jealousy: self.jealousy + other.jealousy,
            care: self.care + other.care,
            anger: self.anger + other.anger,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_initial_values() {
        let state = EmotionalState::default();
        assert_eq!(state.love, 0.85);
        assert_eq!(state.jealousy, 0.20);
        assert_eq!(state.care, 0.50);
        assert_eq!(state.anger, 0.20);
    }

    #[test]
    fn test_new_clamps() {
        let state = EmotionalState::new(1.4, -0.2, 0.5, 2.0);
        assert_eq!(state.love, 1.0);
        assert_eq!(state.jealousy, 0.0);
        assert_eq!(state.care, 0.5);
        assert_eq!(state.anger, 1.0);
    }

    #[test]
    fn test_delta_is_summed_before_single_clamp() {
        // care +0.3 then -0.3 must cancel even when it would overflow in between
        let state = EmotionalState::new(0.5, 0.5, 0.9, 0.5);
        let delta = StateDelta::new(0.0, 0.0, 0.3, 0.0).combine(&StateDelta::new(0.0, 0.0, -0.3, 0.0));
        let next = state.apply_delta(&delta);
        assert!((next.care - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_mood_thresholds() {
        assert_eq!(EmotionalState::new(0.5, 0.9, 0.61, 0.9).mood(), Mode::Care);
        assert_eq!(EmotionalState::new(0.5, 0.6, 0.6, 0.5).mood(), Mode::Psych);
        assert_eq!(EmotionalState::new(0.5, 0.5, 0.6, 0.5).mood(), Mode::Neutral);
    }

    #[test]
    fn test_summary_uses_two_decimals() {
        let state = EmotionalState::default();
        assert_eq!(
            state.summary(),
            "LOVE=0.85; JEALOUSY=0.20; CARE=0.50; ANGER=0.20"
        );
    }
}
