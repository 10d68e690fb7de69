use web_time::{Duration, Instant};

use crate::Seconds;

/// Wall-clock reference for one round, reporting whole elapsed seconds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RoundClock {
    started_at: Instant,
}

impl RoundClock {
    pub fn start() -> Self {
        Self::started_at(Instant::now())
    }

    pub const fn started_at(started_at: Instant) -> Self {
        Self { started_at }
    }

    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.started_at)
    }

    /// Elapsed time at `now`, rounded down to whole seconds.
    pub fn elapsed_secs(&self, now: Instant) -> Seconds {
        self.elapsed(now).as_secs().try_into().unwrap_or(Seconds::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_seconds_round_down() {
        let t0 = Instant::now();
        let clock = RoundClock::started_at(t0);

        assert_eq!(clock.elapsed_secs(t0), 0);
        assert_eq!(clock.elapsed_secs(t0 + Duration::from_millis(999)), 0);
        assert_eq!(clock.elapsed_secs(t0 + Duration::from_millis(1000)), 1);
        assert_eq!(clock.elapsed_secs(t0 + Duration::from_secs(100)), 100);
    }

    #[test]
    fn clock_never_reports_negative_time() {
        let t0 = Instant::now();
        let clock = RoundClock::started_at(t0 + Duration::from_secs(5));
        assert_eq!(clock.elapsed_secs(t0), 0);
    }
}
