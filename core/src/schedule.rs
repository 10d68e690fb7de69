//! Deferred engine work.
//!
//! The engine never owns a timer. Whenever a transition needs to happen later
//! it hands the host a [`Scheduled`] task; the host waits for `delay` and passes
//! the [`Ticket`] back to [`MatchEngine::fire`]. Tickets carry the round
//! [`Generation`] they were issued in, and the engine drops any ticket from an
//! older generation, so timers left over from a previous round can never touch
//! the current one even if the host forgets to cancel them.

use alloc::collections::BinaryHeap;
use alloc::vec::Vec;
use core::cmp::Reverse;
use core::time::Duration;
use serde::{Deserialize, Serialize};

use crate::*;

/// Round counter, advanced by every [`MatchEngine::start_round`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(u32);

impl Generation {
    pub const fn raw(self) -> u32 {
        self.0
    }

    pub(crate) const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    /// Turn a mismatched pair face down and reopen the turn.
    ResolveMismatch,
    /// Finish the power-up peek.
    EndPowerUp,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Ticket {
    pub generation: Generation,
    pub task: TaskKind,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheduled {
    pub ticket: Ticket,
    pub delay: Duration,
}

impl Scheduled {
    pub fn delay_millis(&self) -> u32 {
        self.delay.as_millis().try_into().unwrap_or(u32::MAX)
    }
}

/// Deterministic host for scheduled tasks, driven by virtual time.
///
/// Used wherever no real event loop exists: tests, benchmarks and headless
/// simulations.
#[derive(Clone, Debug, Default)]
pub struct VirtualTimeline {
    now: Duration,
    seq: u64,
    pending: BinaryHeap<Reverse<(Duration, u64, Ticket)>>,
}

impl VirtualTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn push(&mut self, scheduled: Scheduled) {
        self.seq += 1;
        self.pending
            .push(Reverse((self.now + scheduled.delay, self.seq, scheduled.ticket)));
    }

    /// Queues the task of `step`, if any, and hands its events back.
    pub fn accept(&mut self, step: Step) -> Vec<EngineEvent> {
        if let Some(scheduled) = step.scheduled {
            self.push(scheduled);
        }
        step.events
    }

    /// Drops every pending task, like a host clearing its timeouts.
    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    /// Moves time forward by `by`, firing every task that falls due on the way
    /// in due order.
    pub fn advance(&mut self, engine: &mut MatchEngine, by: Duration) -> Vec<EngineEvent> {
        let target = self.now + by;
        let mut events = Vec::new();

        while let Some(&Reverse((due, _, ticket))) = self.pending.peek() {
            if due > target {
                break;
            }
            self.pending.pop();
            self.now = due;
            let step = engine.fire(ticket);
            events.extend(self.accept(step));
        }

        self.now = target;
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_wraps_instead_of_overflowing() {
        let generation = Generation(u32::MAX);
        assert_eq!(generation.next(), Generation(0));
        assert_eq!(Generation::default().next().raw(), 1);
    }

    #[test]
    fn delay_is_reported_in_millis() {
        let scheduled = Scheduled {
            ticket: Ticket {
                generation: Generation::default(),
                task: TaskKind::EndPowerUp,
            },
            delay: Duration::from_millis(1500),
        };
        assert_eq!(scheduled.delay_millis(), 1500);
    }

    #[test]
    fn timeline_tracks_virtual_time() {
        let mut engine = MatchEngine::default();
        let mut timeline = VirtualTimeline::new();

        timeline.push(Scheduled {
            ticket: Ticket {
                generation: engine.generation(),
                task: TaskKind::ResolveMismatch,
            },
            delay: Duration::from_secs(1),
        });
        assert_eq!(timeline.pending_len(), 1);

        timeline.advance(&mut engine, Duration::from_millis(999));
        assert_eq!(timeline.pending_len(), 1);
        assert_eq!(timeline.now(), Duration::from_millis(999));

        let events = timeline.advance(&mut engine, Duration::from_millis(1));
        assert!(events.is_empty());
        assert_eq!(timeline.pending_len(), 0);
    }

    #[test]
    fn cancel_all_drops_pending_tasks() {
        let mut timeline = VirtualTimeline::new();
        timeline.push(Scheduled {
            ticket: Ticket {
                generation: Generation::default(),
                task: TaskKind::EndPowerUp,
            },
            delay: Duration::ZERO,
        });

        timeline.cancel_all();

        assert_eq!(timeline.pending_len(), 0);
    }
}
