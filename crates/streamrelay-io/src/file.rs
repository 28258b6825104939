use std::{
    fs::{File, OpenOptions},
    io::{self, Read, Seek, SeekFrom, Write},
    path::PathBuf,
};

use crate::{mode::StreamMode, stream::Stream};

/// File open configuration, a typed builder standing in for the generic
/// per-stream configuration command other stream abstractions expose as a
/// variadic `ctrl(cmd, args…)`.
#[derive(Clone, Debug)]
pub struct FileOptions {
    pub read: bool,
    pub write: bool,
    pub create: bool,
    pub truncate: bool,
}

impl FileOptions {
    /// A plain read-only source.
    pub fn source() -> Self {
        Self { read: true, write: false, create: false, truncate: false }
    }

    /// `read-write, create, truncate` — the mode a sink opened from a URL
    /// needs.
    pub fn sink() -> Self {
        Self { read: true, write: true, create: true, truncate: true }
    }

    fn to_open_options(&self) -> OpenOptions {
        let mut opts = OpenOptions::new();
        opts.read(self.read).write(self.write).create(self.create).truncate(self.truncate);
        opts
    }
}

pub struct FileStream {
    path: PathBuf,
    options: FileOptions,
    file: Option<File>,
    pos: u64,
}

impl FileStream {
    pub fn new(path: impl Into<PathBuf>, options: FileOptions) -> Self {
        Self { path: path.into(), options, file: None, pos: 0 }
    }

    fn file_mut(&mut self) -> io::Result<&mut File> {
        self.file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "file stream not opened"))
    }
}

impl Stream for FileStream {
    fn mode(&self) -> StreamMode {
        StreamMode::SyncBlocking
    }

    fn is_opened(&self) -> bool {
        self.file.is_some()
    }

    fn open(&mut self) -> io::Result<()> {
        if self.file.is_some() {
            return Ok(());
        }
        let file = self.options.to_open_options().open(&self.path)?;
        self.pos = file.stream_position().unwrap_or(0);
        self.file = Some(file);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.file = None;
        Ok(())
    }

    fn offset(&self) -> u64 {
        self.pos
    }

    fn size(&self) -> Option<u64> {
        self.file.as_ref().and_then(|f| f.metadata().ok()).map(|m| m.len())
    }

    fn seek(&mut self, offset: u64) -> io::Result<()> {
        let pos = self.file_mut()?.seek(SeekFrom::Start(offset))?;
        self.pos = pos;
        Ok(())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.file_mut()?.read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.file_mut()?.write(buf)?;
        self.pos += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        let file = self.file_mut()?;
        file.flush()?;
        file.sync_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_a_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");

        let mut sink = FileStream::new(&path, FileOptions::sink());
        sink.open().unwrap();
        sink.write(b"streamrelay").unwrap();
        sink.flush().unwrap();
        sink.close().unwrap();

        let mut src = FileStream::new(&path, FileOptions::source());
        src.open().unwrap();
        let mut out = Vec::new();
        let mut buf = [0u8; 4];
        loop {
            let n = src.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, b"streamrelay");
    }
}
