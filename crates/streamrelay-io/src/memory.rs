use std::io;

use crate::{
    mode::StreamMode,
    stream::Stream,
};

/// An in-memory byte buffer used as a stream source or sink.
///
/// The buffer is owned for the lifetime of the `MemoryStream`, typically
/// constructed from a caller-supplied `Vec<u8>`.
pub struct MemoryStream {
    buf: Vec<u8>,
    pos: usize,
    opened: bool,
    /// When acting as a sink, `write` appends; when acting as a fixed-size
    /// source, `write` is unused and `read` drains `buf` from `pos`.
    grow_on_write: bool,
}

impl MemoryStream {
    /// A read-only view over pre-existing bytes (used as a transfer source).
    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { buf: data, pos: 0, opened: false, grow_on_write: false }
    }

    /// An initially-empty, growable sink (used as a transfer destination).
    pub fn sink() -> Self {
        Self { buf: Vec::new(), pos: 0, opened: false, grow_on_write: true }
    }

    /// Take ownership of the accumulated bytes, e.g. after a transfer into a
    /// sink `MemoryStream` completes.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }
}

impl Stream for MemoryStream {
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
        self.pos as u64
    }

    fn size(&self) -> Option<u64> {
        Some(self.buf.len() as u64)
    }

    fn seek(&mut self, offset: u64) -> io::Result<()> {
        let offset = offset as usize;
        if offset > self.buf.len() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "seek past end of buffer"));
        }
        self.pos = offset;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let available = &self.buf[self.pos..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.pos += n;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.grow_on_write {
            if self.pos == self.buf.len() {
                self.buf.extend_from_slice(buf);
            } else {
                let end = self.pos + buf.len();
                if end > self.buf.len() {
                    self.buf.resize(end, 0);
                }
                self.buf[self.pos..end].copy_from_slice(buf);
            }
            self.pos += buf.len();
            Ok(buf.len())
        } else {
            let remaining = self.buf.len() - self.pos;
            let n = remaining.min(buf.len());
            self.buf[self.pos..self.pos + n].copy_from_slice(&buf[..n]);
            self.pos += n;
            Ok(n)
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_drains_from_position() {
        let mut s = MemoryStream::from_bytes(vec![1, 2, 3, 4]);
        s.open().unwrap();
        let mut buf = [0u8; 2];
        assert_eq!(s.read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [1, 2]);
        assert_eq!(s.read(&mut buf).unwrap(), 2);
        assert_eq!(buf, [3, 4]);
        assert_eq!(s.read(&mut buf).unwrap(), 0);
    }

    #[test]
    fn sink_grows_on_write() {
        let mut s = MemoryStream::sink();
        s.open().unwrap();
        s.write(b"hello").unwrap();
        s.write(b" world").unwrap();
        assert_eq!(s.into_inner(), b"hello world");
    }

    #[test]
    fn seek_repositions_read_cursor() {
        let mut s = MemoryStream::from_bytes(vec![0, 1, 2, 3, 4, 5]);
        s.seek(3).unwrap();
        let mut buf = [0u8; 3];
        s.read(&mut buf).unwrap();
        assert_eq!(buf, [3, 4, 5]);
    }
}
