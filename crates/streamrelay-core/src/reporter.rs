use crate::{assert::safe_assert, error::CallbackState};

/// The `(offset, size, saved_total, rate)` payload that accompanies every
/// callback state.
#[derive(Debug, Clone, Copy)]
pub struct Report {
    pub input_offset: u64,
    pub input_size: Option<u64>,
    pub saved_total: u64,
    pub rate: u64,
}

/// Enforces the save-callback discipline: exactly one first call before any
/// bytes move, periodic calls on window rollover, at most one `Paused` call
/// between two `Ok` calls, and exactly one terminal call, last.
///
/// This holds no stream or governor state — it's a pure wrapper around the
/// user's closure, callable identically from the sync loop or the async
/// completion handler.
pub struct ProgressReporter<F> {
    callback: F,
    first_emitted: bool,
    terminal_emitted: bool,
}

impl<F> ProgressReporter<F>
where
    F: FnMut(CallbackState, Report) -> bool,
{
    pub fn new(callback: F) -> Self {
        Self { callback, first_emitted: false, terminal_emitted: false }
    }

    /// The very first call: before any bytes transfer, `saved_total=0`,
    /// `rate=0`.
    pub fn first(&mut self, input_offset: u64, input_size: Option<u64>) -> bool {
        safe_assert!(!self.first_emitted, "first report emitted twice");
        self.first_emitted = true;
        let report = Report { input_offset, input_size, saved_total: 0, rate: 0 };
        (self.callback)(CallbackState::Ok, report)
    }

    /// A periodic call on window rollover, carrying the just-measured rate.
    pub fn periodic(&mut self, report: Report) -> bool {
        safe_assert!(self.first_emitted, "periodic report before first report");
        safe_assert!(!self.terminal_emitted, "periodic report after terminal report");
        (self.callback)(CallbackState::Ok, report)
    }

    /// The single call fired when a pause is acknowledged. `rate` is always
    /// reported as 0.
    pub fn paused(&mut self, report: Report) -> bool {
        safe_assert!(!self.terminal_emitted, "paused report after terminal report");
        let report = Report { rate: 0, ..report };
        (self.callback)(CallbackState::Paused, report)
    }

    /// The single terminal call, carrying the cumulative total rate.
    /// Enforces invariant 6 (exactly one terminal call, last).
    pub fn terminal(&mut self, state: CallbackState, report: Report) -> bool {
        safe_assert!(state.is_terminal(), "terminal() called with a non-terminal state");
        safe_assert!(!self.terminal_emitted, "terminal report emitted twice");
        self.terminal_emitted = true;
        (self.callback)(state, report)
    }

    pub fn terminal_emitted(&self) -> bool {
        self.terminal_emitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_report_is_zeroed() {
        let mut seen = Vec::new();
        let mut reporter = ProgressReporter::new(|state, report| {
            seen.push((state, report.saved_total, report.rate));
            true
        });
        reporter.first(0, Some(100));
        assert_eq!(seen, vec![(CallbackState::Ok, 0, 0)]);
    }

    #[test]
    fn callback_returning_false_is_surfaced() {
        let mut reporter = ProgressReporter::new(|_, _| false);
        assert!(!reporter.first(0, None));
    }

    #[test]
    fn only_one_terminal_call_reaches_the_callback() {
        let mut calls = 0;
        let mut reporter = ProgressReporter::new(|_, _| {
            calls += 1;
            true
        });
        reporter.first(0, None);
        reporter.terminal(CallbackState::Closed, Report {
            input_offset: 10,
            input_size: Some(10),
            saved_total: 10,
            rate: 10,
        });
        assert_eq!(calls, 2);
        assert!(reporter.terminal_emitted());
    }
}
