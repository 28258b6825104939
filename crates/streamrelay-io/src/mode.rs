/// How a stream's I/O operations behave when data isn't immediately
/// available.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StreamMode {
    /// `read`/`write` block the calling thread until they can make progress.
    SyncBlocking,
    /// `read`/`write` return `io::ErrorKind::WouldBlock` immediately when
    /// they can't make progress; the caller re-drives the stream from a
    /// [`mio`] readiness event.
    AsyncCompletion,
}

/// Which direction [`crate::Stream::wait`] should block on.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WaitFor {
    Readable,
    Writable,
}
