use thiserror::Error;

/// Errors raised while constructing or opening a stream. Once a stream is
/// open, ordinary I/O failures surface as `std::io::Error` from `read`/
/// `write`/`flush` instead — this enum only covers the setup phase.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("malformed stream url: {0}")]
    BadUrl(#[from] url::ParseError),

    #[error("unsupported url scheme: {0}")]
    UnsupportedScheme(String),

    #[error("url is missing a host: {0}")]
    MissingHost(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
