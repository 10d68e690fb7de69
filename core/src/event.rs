use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

/// Notifications emitted by [`MatchEngine`] for the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    RoundStarted {
        total_pairs: PairCount,
        time_limit_secs: Seconds,
    },
    CardRevealed {
        position: Position,
        species: SpeciesId,
    },
    PairMatched {
        first: Position,
        second: Position,
        species: SpeciesId,
    },
    PairMismatched {
        first: Position,
        second: Position,
    },
    /// A mismatched pair was turned face down again.
    CardsConcealed {
        first: Position,
        second: Position,
    },
    RoundWon {
        click_count: u32,
        elapsed_secs: Seconds,
    },
    TimeExpired {
        matched_pairs: PairCount,
    },
    PowerUpStarted,
    PowerUpEnded,
}

impl EngineEvent {
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::RoundWon { .. } | Self::TimeExpired { .. })
    }
}

/// Result of driving the engine once: the events it produced and, at most, one
/// task the host has to schedule.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Step {
    pub events: Vec<EngineEvent>,
    pub scheduled: Option<Scheduled>,
}

impl Step {
    pub const fn none() -> Self {
        Self {
            events: Vec::new(),
            scheduled: None,
        }
    }

    pub fn has_update(&self) -> bool {
        !self.events.is_empty() || self.scheduled.is_some()
    }

    pub fn ends_round(&self) -> bool {
        self.events.iter().any(EngineEvent::is_terminal)
    }

    pub(crate) fn emit(&mut self, event: EngineEvent) {
        self.events.push(event);
    }

    pub(crate) fn schedule(&mut self, scheduled: Scheduled) {
        debug_assert!(self.scheduled.is_none(), "one task per step");
        self.scheduled = Some(scheduled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn empty_step_has_no_update() {
        let step = Step::none();
        assert!(!step.has_update());
        assert!(!step.ends_round());
    }

    #[test]
    fn terminal_events_end_the_round() {
        let step = Step {
            events: vec![
                EngineEvent::PairMatched {
                    first: 0,
                    second: 1,
                    species: 25,
                },
                EngineEvent::RoundWon {
                    click_count: 2,
                    elapsed_secs: 3,
                },
            ],
            scheduled: None,
        };
        assert!(step.has_update());
        assert!(step.ends_round());
    }

    #[test]
    fn events_serialize_with_variant_names() {
        let json = serde_json::to_string(&EngineEvent::TimeExpired { matched_pairs: 2 }).unwrap();
        assert_eq!(json, r#"{"TimeExpired":{"matched_pairs":2}}"#);
    }
}
