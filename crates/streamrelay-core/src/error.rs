use std::io;

use thiserror::Error;

/// Failures returned directly from a `Transfer` method call (construction,
/// `open`, `resume`, `exit`). These are "programmer error" style contract
/// violations — they're detected and returned before any stream I/O
/// happens, without going through the save callback.
#[derive(Error, Debug)]
pub enum TransferError {
    #[error("transfer is already open")]
    AlreadyOpened,
    #[error("transfer has not been opened")]
    NotOpened,
    #[error("transfer has already been stopped")]
    Stopped,
    #[error("cannot resume: a pause request is still pending acknowledgement")]
    PausePending,
    #[error(transparent)]
    Stream(#[from] streamrelay_io::StreamError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// The abstract state carried by the open/save callbacks.
///
/// `Io` carries only the `io::ErrorKind`, not the full `io::Error` — the
/// callback only needs to classify the failure, and `ErrorKind` is `Copy`
/// which keeps [`crate::reporter::Report`] cheap to pass around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackState {
    Ok,
    Paused,
    Closed,
    Killed,
    Timeout,
    UnknownError,
    Io(io::ErrorKind),
}

impl CallbackState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, CallbackState::Ok | CallbackState::Paused)
    }
}

impl From<&io::Error> for CallbackState {
    fn from(e: &io::Error) -> Self {
        CallbackState::Io(e.kind())
    }
}
