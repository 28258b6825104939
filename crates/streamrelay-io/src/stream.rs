use std::io;

use crate::mode::{StreamMode, WaitFor};

/// The stream capability the transfer engine needs from a source or sink:
/// open/close/seek, read/write, mode interrogation.
///
/// Implementations for an `AsyncCompletion` stream must never block: `read`
/// and `write` return `Err(WouldBlock)` the moment they can't make progress,
/// and the caller (the async controller) re-drives the call after a
/// [`mio`] readiness event. `SyncBlocking` implementations may block inside
/// `read`/`write` directly.
pub trait Stream: Send {
    fn mode(&self) -> StreamMode;

    fn is_opened(&self) -> bool;

    /// Perform any setup (opening a file, connecting a socket) needed before
    /// `read`/`write` can be called. Idempotent: calling `open` again on an
    /// already-opened stream is a no-op that returns `Ok(())`.
    fn open(&mut self) -> io::Result<()>;

    /// Release the underlying resource. Idempotent.
    fn close(&mut self) -> io::Result<()>;

    /// Best-effort abort of any in-flight operation. Unlike `close`, this
    /// never blocks and never fails — it's meant to be callable from a
    /// cancellation path where the stream may already be half-torn-down.
    fn kill(&mut self) {}

    /// Bytes consumed (read) or produced (written) so far, relative to
    /// wherever the stream started.
    fn offset(&self) -> u64;

    /// Total size, if known up front (files, memory buffers). `None` for
    /// streams where size isn't meaningful (sockets).
    fn size(&self) -> Option<u64> {
        None
    }

    /// Bytes remaining, if `size` is known.
    fn left(&self) -> Option<u64> {
        self.size().map(|s| s.saturating_sub(self.offset()))
    }

    /// Reposition the read/write cursor. Only meaningful for seekable
    /// streams (files, memory buffers); sockets return an error.
    fn seek(&mut self, offset: u64) -> io::Result<()>;

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Flush buffered writes. For file sinks this is an `fsync`-equivalent;
    /// for sockets, a no-op; for memory sinks, always a no-op.
    fn flush(&mut self) -> io::Result<()>;

    /// Block the calling thread until the stream is ready for `which`, or
    /// `timeout` elapses. Only called by the sync controller. The default
    /// implementation treats the stream as always ready, which is correct
    /// for memory and file streams.
    fn wait(&mut self, which: WaitFor, timeout: std::time::Duration) -> io::Result<bool> {
        let _ = (which, timeout);
        Ok(true)
    }
}

/// A [`Stream`] in `AsyncCompletion` mode that can be driven by a [`mio`]
/// event loop. The async controller registers interest once the stream is
/// open and re-registers whenever the set of interests it needs changes
/// (e.g. arming `WRITABLE` only while there's a pending write).
pub trait PollableStream: Stream {
    /// Registers initial interest. The caller passes the interest this
    /// endpoint will actually wait on (`READABLE` for a source, `WRITABLE`
    /// for a sink) rather than a hardcoded default, so the first
    /// `WaitOn`/`reregister` comparison in the async driver sees the
    /// registration it expects instead of silently skipping it.
    fn register(&mut self, registry: &mio::Registry, token: mio::Token, interest: mio::Interest) -> io::Result<()>;

    fn reregister(
        &mut self,
        registry: &mio::Registry,
        token: mio::Token,
        interest: mio::Interest,
    ) -> io::Result<()>;

    fn deregister(&mut self, registry: &mio::Registry) -> io::Result<()>;
}
