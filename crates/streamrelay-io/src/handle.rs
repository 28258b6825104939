use std::io::{self, Read, Write};

use crate::{mode::StreamMode, stream::Stream};

/// Wraps an already-connected blocking handle (a `TcpStream`, a
/// `UnixStream`, anything `Read + Write`) as a [`Stream`].
///
/// Unlike [`crate::FileStream`] there's no separate open step: the handle is
/// connected by the time it's handed to `HandleStream::new`, matching the
/// "constructors accepting pre-built handles" half of the transfer engine's
/// constructor matrix. `open` just flips the opened flag.
pub struct HandleStream<T> {
    inner: T,
    opened: bool,
    offset: u64,
}

impl<T> HandleStream<T> {
    pub fn new(inner: T) -> Self {
        Self { inner, opened: true, offset: 0 }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read + Write + Send> Stream for HandleStream<T> {
    fn mode(&self) -> StreamMode {
        StreamMode::SyncBlocking
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
        Err(io::Error::new(io::ErrorKind::Unsupported, "handle streams are not seekable"))
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

#[cfg(test)]
mod tests {
    use std::{
        net::{TcpListener, TcpStream},
        thread,
    };

    use super::*;

    #[test]
    fn wraps_a_real_tcp_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut sock, _) = listener.accept().unwrap();
            let mut buf = [0u8; 5];
            sock.read_exact(&mut buf).unwrap();
            buf
        });

        let mut client = HandleStream::new(TcpStream::connect(addr).unwrap());
        client.write(b"hello").unwrap();
        client.flush().unwrap();

        assert_eq!(&server.join().unwrap(), b"hello");
    }
}
