use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

use crate::error::TransferError;

/// Cross-thread transfer control, split out from the governor/reporter/state
/// machine so a [`TransferHandle`] can be cloned and handed to another
/// thread: `pause`/`resume`/`kill`/`limit` may be called from any thread.
/// Plain atomics rather than a mutex, since each flag is a single bit of
/// cross-thread signaling rather than a larger piece of shared state.
#[derive(Debug)]
pub(crate) struct Flags {
    pub(crate) stopped: AtomicBool,
    pub(crate) opened: AtomicBool,
    pub(crate) paused: AtomicBool,
    pub(crate) pausing: AtomicBool,
    pub(crate) rate_limit: Arc<AtomicU64>,
}

impl Flags {
    pub(crate) fn new(rate_limit: u64) -> Arc<Self> {
        Arc::new(Self {
            stopped: AtomicBool::new(false),
            opened: AtomicBool::new(false),
            paused: AtomicBool::new(false),
            pausing: AtomicBool::new(false),
            rate_limit: Arc::new(AtomicU64::new(rate_limit)),
        })
    }
}

/// A cloneable remote control for a running [`crate::Transfer`]'s
/// `pause`/`resume`/`kill`/`limit`. Holding one does not keep the transfer's
/// streams alive; it only touches the shared atomics the controller checks
/// on its next step.
#[derive(Clone, Debug)]
pub struct TransferHandle {
    pub(crate) flags: Arc<Flags>,
}

impl TransferHandle {
    pub(crate) fn new(flags: Arc<Flags>) -> Self {
        Self { flags }
    }

    /// Requests a pause. A no-op if already paused or already pausing —
    /// never an error.
    pub fn pause(&self) {
        if self.flags.paused.load(Ordering::Acquire) {
            return;
        }
        self.flags.pausing.store(true, Ordering::Release);
    }

    /// Clears a pause. A no-op (returns success) if the transfer was never
    /// paused to begin with. Fails if not opened, if stopped, or while a
    /// pause request is still pending acknowledgement (the controller
    /// hasn't yet fired the `Paused` report).
    pub fn resume(&self) -> Result<(), TransferError> {
        if !self.flags.opened.load(Ordering::Acquire) {
            return Err(TransferError::NotOpened);
        }
        if self.flags.stopped.load(Ordering::Acquire) {
            return Err(TransferError::Stopped);
        }
        if self.flags.pausing.load(Ordering::Acquire) {
            return Err(TransferError::PausePending);
        }
        self.flags.paused.store(false, Ordering::Release);
        Ok(())
    }

    /// Idempotent: the first caller to flip `stopped` wins the race and the
    /// controller propagates the kill to both streams on its next step.
    pub fn kill(&self) {
        self.flags.stopped.store(true, Ordering::Release);
    }

    /// Changes the rate limit in flight. `0` means unlimited.
    pub fn limit(&self, bytes_per_sec: u64) {
        self.flags.rate_limit.store(bytes_per_sec, Ordering::Release);
    }

    pub fn is_paused(&self) -> bool {
        self.flags.paused.load(Ordering::Acquire)
    }

    pub fn is_stopped(&self) -> bool {
        self.flags.stopped.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opened_handle() -> TransferHandle {
        let flags = Flags::new(0);
        flags.opened.store(true, Ordering::Release);
        TransferHandle::new(flags)
    }

    #[test]
    fn resume_is_a_no_op_success_when_never_paused() {
        let handle = opened_handle();
        assert!(handle.resume().is_ok());
        assert!(!handle.is_paused());
    }

    #[test]
    fn resume_clears_an_acknowledged_pause() {
        let handle = opened_handle();
        handle.flags.paused.store(true, Ordering::Release);
        assert!(handle.resume().is_ok());
        assert!(!handle.is_paused());
    }

    #[test]
    fn resume_fails_while_a_pause_is_still_pending_acknowledgement() {
        let handle = opened_handle();
        handle.flags.pausing.store(true, Ordering::Release);
        assert!(matches!(handle.resume(), Err(TransferError::PausePending)));
    }

    #[test]
    fn resume_fails_once_stopped() {
        let handle = opened_handle();
        handle.kill();
        assert!(matches!(handle.resume(), Err(TransferError::Stopped)));
    }

    #[test]
    fn resume_fails_before_open() {
        let flags = Flags::new(0);
        let handle = TransferHandle::new(flags);
        assert!(matches!(handle.resume(), Err(TransferError::NotOpened)));
    }

    #[test]
    fn pause_is_idempotent_once_acknowledged() {
        let handle = opened_handle();
        handle.flags.paused.store(true, Ordering::Release);
        handle.pause();
        assert!(!handle.flags.pausing.load(Ordering::Acquire));
    }
}
