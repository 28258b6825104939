//! Monotonic clock and periodic-trigger types shared by the streamrelay
//! transfer engine.

mod duration;
mod global_clock;
mod instant;
mod repeater;

pub use duration::Duration;
pub use global_clock::{global_clock, init_global_with_mock};
pub use instant::Instant;
pub use repeater::Repeater;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_saturates() {
        let d = Duration::from_millis(5);
        assert_eq!(d.saturating_sub(Duration::from_millis(10)), Duration::ZERO);
    }

    #[test]
    fn repeater_fires_after_interval() {
        let mock = init_global_with_mock();
        let mut r = Repeater::every(Duration::from_millis(100));
        assert!(!r.fired());
        mock.increment(50_000_000); // 50ms in nanoseconds
        assert!(!r.fired());
        mock.increment(60_000_000); // total 110ms
        assert!(r.fired());
        assert!(!r.fired());
    }
}
