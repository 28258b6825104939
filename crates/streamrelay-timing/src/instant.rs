use std::ops::{Add, Sub};

use crate::{Duration, global_clock};

/// A monotonic timestamp in milliseconds since an arbitrary process-local
/// epoch. Only meaningful relative to another `Instant` from the same
/// process — never serialize this across a process boundary.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant(pub u64);

impl Instant {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub fn now() -> Self {
        global_clock::instant_now()
    }

    #[inline]
    pub fn elapsed(self) -> Duration {
        Self::now().saturating_sub(self)
    }

    #[inline]
    pub fn saturating_sub(self, other: Instant) -> Duration {
        Duration(self.0.saturating_sub(other.0))
    }
}

impl Sub for Instant {
    type Output = Duration;
    fn sub(self, rhs: Instant) -> Duration {
        self.saturating_sub(rhs)
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;
    fn add(self, rhs: Duration) -> Instant {
        Instant(self.0.saturating_add(rhs.0))
    }
}
