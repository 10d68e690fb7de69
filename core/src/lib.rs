#![no_std]

extern crate alloc;

use core::fmt;
use core::str::FromStr;
use core::time::Duration;
use serde::{Deserialize, Serialize};

pub use board::*;
pub use card::*;
pub use clock::*;
pub use engine::*;
pub use error::*;
pub use event::*;
pub use schedule::*;
pub use supplier::*;
pub use types::*;

mod board;
mod card;
mod clock;
mod engine;
mod error;
mod event;
mod schedule;
mod supplier;
mod types;

/// Delays the engine asks its host to wait for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timing {
    /// How long a mismatched pair stays face up.
    pub mismatch_delay: Duration,
    /// How long the power-up shows every face.
    pub power_up_duration: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            mismatch_delay: Duration::from_secs(1),
            power_up_duration: Duration::from_secs(1),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Easy, Self::Medium, Self::Hard];

    pub const fn pairs(self) -> PairCount {
        use Difficulty::*;
        match self {
            Easy => 3,
            Medium => 6,
            Hard => 12,
        }
    }

    pub const fn time_limit_secs(self) -> Seconds {
        use Difficulty::*;
        match self {
            Easy => 100,
            Medium => 200,
            Hard => 300,
        }
    }

    pub const fn name(self) -> &'static str {
        use Difficulty::*;
        match self {
            Easy => "easy",
            Medium => "medium",
            Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UnknownDifficulty;

impl fmt::Display for UnknownDifficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected one of: easy, medium, hard")
    }
}

impl core::error::Error for UnknownDifficulty {}

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|difficulty| difficulty.name().eq_ignore_ascii_case(s.trim()))
            .ok_or(UnknownDifficulty)
    }
}

/// Everything needed to set up and run one round.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    pub pairs: PairCount,
    pub time_limit_secs: Seconds,
    pub timing: Timing,
}

impl RoundConfig {
    pub const fn new_unchecked(pairs: PairCount, time_limit_secs: Seconds, timing: Timing) -> Self {
        Self {
            pairs,
            time_limit_secs,
            timing,
        }
    }

    pub fn new(pairs: PairCount, time_limit_secs: Seconds) -> Self {
        let pairs = pairs.clamp(1, MAX_PAIRS);
        let time_limit_secs = time_limit_secs.max(1);
        Self::new_unchecked(pairs, time_limit_secs, Timing::default())
    }

    #[must_use]
    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub const fn card_count(&self) -> usize {
        card_count(self.pairs)
    }
}

impl From<Difficulty> for RoundConfig {
    fn from(difficulty: Difficulty) -> Self {
        Self::new(difficulty.pairs(), difficulty.time_limit_secs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_presets() {
        let presets: [(PairCount, Seconds); 3] = Difficulty::ALL.map(|d| (d.pairs(), d.time_limit_secs()));
        assert_eq!(presets, [(3, 100), (6, 200), (12, 300)]);
    }

    #[test]
    fn difficulty_parses_from_lowercase_name() {
        assert_eq!("easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!(" Hard".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert_eq!("extreme".parse::<Difficulty>(), Err(UnknownDifficulty));
        assert_eq!(alloc::format!("{}", Difficulty::Medium), "medium");
    }

    #[test]
    fn difficulty_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Difficulty::Hard).unwrap(), r#""hard""#);
    }

    #[test]
    fn round_config_from_difficulty() {
        let config = RoundConfig::from(Difficulty::Hard);
        assert_eq!(config.pairs, 12);
        assert_eq!(config.card_count(), 24);
        assert_eq!(config.time_limit_secs, 300);
        assert_eq!(config.timing, Timing::default());
    }

    #[test]
    fn round_config_clamps_to_playable_values() {
        let config = RoundConfig::new(0, 0);
        assert_eq!((config.pairs, config.time_limit_secs), (1, 1));
        assert_eq!(RoundConfig::new(PairCount::MAX, 10).pairs, MAX_PAIRS);
    }
}
