use std::io::{self, Read, Write};

use mio::{Interest, Registry, Token, event::Source};

use crate::{
    mode::StreamMode,
    stream::{PollableStream, Stream},
};

/// A non-blocking socket handle (`mio::net::TcpStream` or
/// `mio::net::UnixStream`) driven by readiness events.
///
/// `read`/`write` are attempted eagerly and any `WouldBlock` is surfaced to
/// the caller rather than retried internally — the caller re-drives the
/// call after the next `mio` readiness event instead.
pub struct NonBlockingStream<T> {
    inner: T,
    opened: bool,
    offset: u64,
}

impl<T> NonBlockingStream<T> {
    pub fn new(inner: T) -> Self {
        Self { inner, opened: true, offset: 0 }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write + Send> Stream for NonBlockingStream<T> {
    fn mode(&self) -> StreamMode {
        StreamMode::AsyncCompletion
    }

    fn is_opened(&self) -> bool {
        self.opened
    }

    fn open(&mut self) -> io::Result<()> {
        self.opened = true;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.opened = false;
        Ok(())
    }

    fn offset(&self) -> u64 {
        self.offset
    }

    fn seek(&mut self, _offset: u64) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "socket streams are not seekable"))
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.offset += n as u64;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.offset += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<T: Read + Write + Send + Source> PollableStream for NonBlockingStream<T> {
    fn register(&mut self, registry: &Registry, token: Token, interest: Interest) -> io::Result<()> {
        registry.register(&mut self.inner, token, interest)
    }

    fn reregister(&mut self, registry: &Registry, token: Token, interest: Interest) -> io::Result<()> {
        registry.reregister(&mut self.inner, token, interest)
    }

    fn deregister(&mut self, registry: &Registry) -> io::Result<()> {
        registry.deregister(&mut self.inner)
    }
}
