use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use streamrelay_timing::{Duration, Instant};

/// The largest single read request the engine ever issues when no rate
/// limit is set (32 KiB), matching typical socket/pipe buffer sizing
/// rather than an arbitrary constant.
pub const BLOCK_MAX: usize = 32 * 1024;

const WINDOW: Duration = Duration::from_secs(1);

/// Result of one governor tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GovernorTick {
    /// Milliseconds the caller should wait before issuing the next read.
    pub delay: Duration,
    /// `true` if this tick rolled the 1-second window over — the caller
    /// should emit a periodic progress report when this is set.
    pub rolled_over: bool,
}

/// Per-second byte accounting and rate-limit delay computation.
///
/// Pure bookkeeping over `(base_ts, window_ts, saved_total, saved_window,
/// current_rate)` — no I/O, no callbacks. The sync controller calls
/// [`RateGovernor::on_write`] inline in its loop; the async controller calls
/// it from the write-completion callback. Identical either way, since both
/// flavors drive the same pure accounting function.
#[derive(Debug)]
pub struct RateGovernor {
    base_ts: Instant,
    window_ts: Instant,
    saved_total: u64,
    saved_window: u64,
    current_rate: u64,
    rate_limit: Arc<AtomicU64>,
}

impl RateGovernor {
    pub fn new(rate_limit: Arc<AtomicU64>) -> Self {
        Self::starting_at(rate_limit, Instant::now())
    }

    /// Like [`RateGovernor::new`] but anchored to an explicit timestamp
    /// instead of the live clock — lets unit tests exercise the window math
    /// deterministically without touching the process-global clock.
    pub fn starting_at(rate_limit: Arc<AtomicU64>, now: Instant) -> Self {
        Self {
            base_ts: now,
            window_ts: now,
            saved_total: 0,
            saved_window: 0,
            current_rate: 0,
            rate_limit,
        }
    }

    pub fn rate_limit(&self) -> u64 {
        self.rate_limit.load(Ordering::Relaxed)
    }

    pub fn base_ts(&self) -> Instant {
        self.base_ts
    }

    pub fn saved_total(&self) -> u64 {
        self.saved_total
    }

    pub fn current_rate(&self) -> u64 {
        self.current_rate
    }

    /// The read size to request this cycle: `min(rate_limit, BLOCK_MAX)`
    /// when a limit is set, `BLOCK_MAX` when unlimited. Never reads more
    /// than the rate limit in one go, so a single oversized read can't
    /// blow straight through the window budget.
    pub fn read_request_size(&self) -> usize {
        match self.rate_limit() {
            0 => BLOCK_MAX,
            limit => usize::try_from(limit).unwrap_or(usize::MAX).min(BLOCK_MAX),
        }
    }

    /// Account `n` bytes written at `now` and compute the delay before the
    /// next read.
    pub fn on_write(&mut self, n: u64, now: Instant) -> GovernorTick {
        self.saved_total += n;

        if now < self.window_ts + WINDOW {
            self.saved_window += n;
            if now < self.base_ts + WINDOW {
                self.current_rate = self.saved_window;
            }
            let limit = self.rate_limit();
            let delay = if limit > 0 && self.saved_window >= limit {
                (self.window_ts + WINDOW).saturating_sub(now)
            } else {
                Duration::ZERO
            };
            GovernorTick { delay, rolled_over: false }
        } else {
            self.current_rate = self.saved_window;
            self.window_ts = now;
            self.saved_window = 0;
            GovernorTick { delay: Duration::ZERO, rolled_over: true }
        }
    }

    /// The cumulative rate to report in the terminal callback:
    /// `saved_total * 1000 / max(1, t_end - base_ts)`.
    pub fn total_rate(&self, now: Instant) -> u64 {
        let elapsed_ms = now.saturating_sub(self.base_ts).as_millis().max(1);
        self.saved_total.saturating_mul(1000) / elapsed_ms
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU64;

    use super::*;

    // Deterministic timestamps built directly rather than through
    // `Instant::now()`, so these tests never touch the process-global clock
    // and stay independent of wall-clock scheduling or other tests.
    fn governor_with_limit(limit: u64, t0: Instant) -> (RateGovernor, Arc<AtomicU64>) {
        let rate_limit = Arc::new(AtomicU64::new(limit));
        (RateGovernor::starting_at(rate_limit.clone(), t0), rate_limit)
    }

    #[test]
    fn unlimited_never_delays() {
        let t0 = Instant(0);
        let (mut gov, _rl) = governor_with_limit(0, t0);
        let tick = gov.on_write(1_000_000, t0);
        assert_eq!(tick.delay, Duration::ZERO);
        assert_eq!(gov.saved_total(), 1_000_000);
    }

    #[test]
    fn limited_delays_once_window_budget_is_spent() {
        let t0 = Instant(0);
        let (mut gov, _rl) = governor_with_limit(1000, t0);
        let first = gov.on_write(900, t0);
        assert_eq!(first.delay, Duration::ZERO);

        let t1 = t0 + Duration::from_millis(1); // still the same window
        let second = gov.on_write(200, t1);
        assert!(second.delay.as_millis() > 0, "should throttle once over budget");
    }

    #[test]
    fn window_rollover_resets_saved_window_and_reports() {
        let t0 = Instant(0);
        let (mut gov, _rl) = governor_with_limit(0, t0);
        gov.on_write(500, t0);

        let t1 = t0 + Duration::from_millis(1100);
        let tick = gov.on_write(300, t1);
        assert!(tick.rolled_over);
        assert_eq!(gov.current_rate(), 500);
    }

    #[test]
    fn total_rate_uses_base_ts_not_window() {
        let t0 = Instant(0);
        let (mut gov, _rl) = governor_with_limit(0, t0);
        gov.on_write(1_000_000, t0);
        let t1 = t0 + Duration::from_millis(1000);
        let rate = gov.total_rate(t1);
        assert!((900_000..=1_100_000).contains(&rate));
    }

    #[test]
    fn read_request_size_caps_at_block_max() {
        let t0 = Instant(0);
        let (gov, _rl) = governor_with_limit(BLOCK_MAX as u64 * 4, t0);
        assert_eq!(gov.read_request_size(), BLOCK_MAX);
        let (gov, _rl) = governor_with_limit(1024, t0);
        assert_eq!(gov.read_request_size(), 1024);
        let (gov, _rl) = governor_with_limit(0, t0);
        assert_eq!(gov.read_request_size(), BLOCK_MAX);
    }
}
