use crate::{Duration, Instant};

/// Fires at most once per `interval`. Used by the rate governor to decide
/// whether the current 1-second window has rolled over, and can double as a
/// low-frequency heartbeat for callers that want periodic progress polling
/// outside of the governor's own schedule.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Repeater {
    interval: Duration,
    last_fired: Instant,
}

impl Repeater {
    #[inline]
    pub fn every(interval: Duration) -> Self {
        Self { interval, last_fired: Instant::ZERO }
    }

    /// Returns `true` and resets the interval if it has elapsed since the
    /// last time this returned `true`.
    #[inline]
    pub fn fired(&mut self) -> bool {
        if self.last_fired.elapsed() >= self.interval {
            self.last_fired = Instant::now();
            true
        } else {
            false
        }
    }

    #[inline]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn reset(&mut self) {
        self.last_fired = Instant::now();
    }
}
