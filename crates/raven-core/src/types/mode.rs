//! Time-of-day mood register.

use chrono::{Local, Timelike};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Discrete mood register.
///
/// The same three labels name both the time-of-day mode and the emoji set
/// picked from the emotional state.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Mode {
    Psych,
    Care,
    Neutral,
}

impl Mode {
    /// Mode for an hour of the day (0..=23).
    ///
    /// `[02,07)` and `[19,24)` psych, `[07,13)` care, `[13,19)` and `[00,02)` neutral.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            2..=6 => Mode::Psych,
            7..=12 => Mode::Care,
            13..=18 => Mode::Neutral,
            19..=23 => Mode::Psych,
            _ => Mode::Neutral,
        }
    }

    /// Mode at a given wall-clock time.
    pub fn at<T: Timelike>(time: &T) -> Self {
        Self::from_hour(time.hour())
    }

    /// Mode at the current local time.
    pub fn now() -> Self {
        Self::at(&Local::now())
    }

    /// Sampling temperature for generation in this mode.
    pub fn temperature(&self) -> f32 {
        match self {
            Mode::Psych => 0.9,
            _ => 0.7,
        }
    }

    /// Emoji set for this register.
    pub fn emojis(&self) -> &'static [&'static str] {
        match self {
            Mode::Care => &["🫂", "🤍", "🍵", "🌙"],
            Mode::Psych => &["🖤", "🔥", "😈", "💥"],
            Mode::Neutral => &["👌", "👀", "🤝", "🤌"],
        }
    }
}
