use once_cell::sync::OnceCell;
use quanta::Instant as RawInstant;

use crate::Instant;

static EPOCH: OnceCell<RawInstant> = OnceCell::new();
static CLOCK: OnceCell<quanta::Clock> = OnceCell::new();

/// The process-wide monotonic clock. Lazily created on first use so tests
/// that install a mock clock via [`init_global_with_mock`] can do so before
/// anything else touches the time.
#[inline]
pub fn global_clock() -> &'static quanta::Clock {
    CLOCK.get_or_init(quanta::Clock::new)
}

fn epoch() -> RawInstant {
    *EPOCH.get_or_init(|| global_clock().now())
}

/// Install a mock clock for deterministic tests (rate-governor window
/// rollover, delay computation) and return its controller so the test can
/// advance time explicitly.
///
/// Panics if the global clock was already observed by something else, since
/// at that point the epoch has already been captured against real time.
pub fn init_global_with_mock() -> std::sync::Arc<quanta::Mock> {
    let (clock, controller) = quanta::Clock::mock();
    CLOCK
        .set(clock)
        .unwrap_or_else(|_| panic!("global clock already initialized before mock install"));
    let now = global_clock().now();
    EPOCH
        .set(now)
        .unwrap_or_else(|_| panic!("global clock epoch already captured before mock install"));
    controller
}

#[inline]
pub(crate) fn now_ms() -> u64 {
    let elapsed = global_clock().now().duration_since(epoch());
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

#[inline]
pub(crate) fn instant_now() -> Instant {
    Instant(now_ms())
}
