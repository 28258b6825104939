use std::{
    net::TcpStream as StdTcpStream,
    os::unix::net::UnixStream as StdUnixStream,
};

use url::Url;

use crate::{
    error::StreamError,
    file::{FileOptions, FileStream},
    handle::HandleStream,
    stream::Stream,
};

/// Build a stream from a URL string, one of the "URL string" constructor
/// forms in the transfer engine's constructor matrix.
///
/// Supported schemes:
/// - `file://<path>` — opened with [`FileOptions::sink`] if `for_sink` is
///   set (read-write, create, truncate), otherwise [`FileOptions::source`].
/// - `tcp://host:port` — connects a blocking TCP socket.
/// - `unix:///path/to/socket` — connects a blocking Unix domain socket.
pub fn stream_from_url(url: &str, for_sink: bool) -> Result<Box<dyn Stream>, StreamError> {
    let parsed = Url::parse(url)?;
    match parsed.scheme() {
        "file" => {
            let path = parsed.to_file_path().map_err(|()| StreamError::MissingHost(url.to_string()))?;
            let options = if for_sink { FileOptions::sink() } else { FileOptions::source() };
            Ok(Box::new(FileStream::new(path, options)))
        }
        "tcp" => {
            let host = parsed.host_str().ok_or_else(|| StreamError::MissingHost(url.to_string()))?;
            let port = parsed.port().ok_or_else(|| StreamError::MissingHost(url.to_string()))?;
            let sock = StdTcpStream::connect((host, port))?;
            Ok(Box::new(HandleStream::new(sock)))
        }
        "unix" => {
            let path = parsed.path();
            let sock = StdUnixStream::connect(path)?;
            Ok(Box::new(HandleStream::new(sock)))
        }
        other => Err(StreamError::UnsupportedScheme(other.to_string())),
    }
}
