use std::{
    io,
    sync::{
        Arc,
        atomic::Ordering,
    },
};

use streamrelay_io::{Stream, WaitFor};
use streamrelay_timing::{Duration, Instant};

use crate::{
    error::CallbackState,
    flags::Flags,
    governor::RateGovernor,
    reporter::{ProgressReporter, Report},
};

/// Where the read/write cycle currently is — the running state broken down
/// into its sub-steps; pausing, flushing, and stopping are modeled by
/// [`StepOutcome`] rather than as additional phases, since they're
/// transient outcomes of a step rather than places more reading happens.
enum Phase {
    Reading,
    /// A read completed with `len` bytes in `buf`; `written` of them have
    /// been handed to the sink so far. `written < len` after a short write
    /// means the controller will immediately retry the remainder without a
    /// governor tick.
    Writing { buf: Vec<u8>, len: usize, written: usize },
    Flushing,
}

/// What the driver (sync loop or async event loop) should do after a step.
pub(crate) enum StepOutcome {
    /// Call `step` again immediately.
    Continue,
    /// The stream that would block is ready; wait on it before retrying.
    WaitOn(WaitFor),
    /// The governor wants the next read delayed by this long.
    Sleep(Duration),
    /// A pause was just acknowledged; wait for `resume()` or `kill()`.
    Paused,
    /// The transfer reached a terminal state; the callback already fired.
    Done(CallbackState),
}

/// The open-read-write-close state machine, minus the stream pair (passed
/// in per step so the same controller drives either a blocking or a
/// non-blocking pair — see `Transfer::save_sync`/`save_async`).
pub(crate) struct Controller<F> {
    phase: Phase,
    governor: RateGovernor,
    reporter: ProgressReporter<F>,
    flags: Arc<Flags>,
}

impl<F> Controller<F>
where
    F: FnMut(CallbackState, Report) -> bool,
{
    pub(crate) fn new(flags: Arc<Flags>, callback: F) -> Self {
        Self {
            phase: Phase::Reading,
            governor: RateGovernor::new(flags.rate_limit.clone()),
            reporter: ProgressReporter::new(callback),
            flags,
        }
    }

    pub(crate) fn emit_first(&mut self, input: &dyn Stream) -> bool {
        self.reporter.first(input.offset(), input.size())
    }

    /// Routes a `false` return from the init-call through the same
    /// terminal path as a mid-transfer rejection (see `finish_write`'s
    /// `periodic` check), so a user that cancels at the very first
    /// callback still gets exactly one terminal report per invariant 6.
    pub(crate) fn reject_first(&mut self, input: &dyn Stream) -> StepOutcome {
        self.terminal(input, CallbackState::UnknownError)
    }

    pub(crate) fn current_rate(&self) -> u64 {
        self.governor.current_rate()
    }

    pub(crate) fn step(&mut self, input: &mut dyn Stream, output: &mut dyn Stream) -> StepOutcome {
        // Error dominates pause when both arrive on the same completion, so
        // stop/error checks always run before the pause check inside
        // `finish_write`.
        if self.flags.stopped.load(Ordering::Acquire) {
            input.kill();
            output.kill();
            return self.terminal(input, CallbackState::Killed);
        }

        match &mut self.phase {
            Phase::Reading => {
                let size = self.governor.read_request_size();
                let mut buf = vec![0u8; size];
                match input.read(&mut buf) {
                    Ok(0) => {
                        self.phase = Phase::Flushing;
                        StepOutcome::Continue
                    }
                    Ok(n) => {
                        buf.truncate(n);
                        self.phase = Phase::Writing { buf, len: n, written: 0 };
                        StepOutcome::Continue
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                        StepOutcome::WaitOn(WaitFor::Readable)
                    }
                    Err(e) => self.terminal_io(input, e),
                }
            }

            Phase::Writing { buf, len, written } => {
                let len = *len;
                match output.write(&buf[*written..len]) {
                    Ok(0) => {
                        let err = io::Error::new(io::ErrorKind::WriteZero, "sink wrote 0 bytes");
                        self.terminal_io(input, err)
                    }
                    Ok(n) => {
                        *written += n;
                        if *written < len {
                            // Short write: retry the remainder immediately,
                            // no governor tick.
                            StepOutcome::Continue
                        } else {
                            self.phase = Phase::Reading;
                            self.finish_write(input, len as u64)
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                        StepOutcome::WaitOn(WaitFor::Writable)
                    }
                    Err(e) => self.terminal_io(input, e),
                }
            }

            Phase::Flushing => match output.flush() {
                Ok(()) => self.terminal(input, CallbackState::Closed),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    StepOutcome::WaitOn(WaitFor::Writable)
                }
                Err(e) => self.terminal_io(input, e),
            },
        }
    }

    fn finish_write(&mut self, input: &dyn Stream, n: u64) -> StepOutcome {
        let now = Instant::now();
        let tick = self.governor.on_write(n, now);

        if self.flags.stopped.load(Ordering::Acquire) {
            return self.terminal(input, CallbackState::Killed);
        }

        if self.flags.pausing.load(Ordering::Acquire) || self.flags.paused.load(Ordering::Acquire)
        {
            self.flags.paused.store(true, Ordering::Release);
            self.flags.pausing.store(false, Ordering::Release);
            let report = self.report_for(input, 0);
            self.reporter.paused(report);
            return StepOutcome::Paused;
        }

        if tick.rolled_over {
            let report = self.report_for(input, self.governor.current_rate());
            if !self.reporter.periodic(report) {
                return self.terminal(input, CallbackState::UnknownError);
            }
        }

        if tick.delay > Duration::ZERO { StepOutcome::Sleep(tick.delay) } else { StepOutcome::Continue }
    }

    fn terminal_io(&mut self, input: &dyn Stream, err: io::Error) -> StepOutcome {
        let state = CallbackState::from(&err);
        tracing::debug!(?err, "transfer: terminal io error");
        self.terminal(input, state)
    }

    fn terminal(&mut self, input: &dyn Stream, state: CallbackState) -> StepOutcome {
        let now = Instant::now();
        let rate = self.governor.total_rate(now);
        let report = self.report_for(input, rate);
        self.reporter.terminal(state, report);
        StepOutcome::Done(state)
    }

    fn report_for(&self, input: &dyn Stream, rate: u64) -> Report {
        Report {
            input_offset: input.offset(),
            input_size: input.size(),
            saved_total: self.governor.saved_total(),
            rate,
        }
    }
}
