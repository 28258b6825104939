//! The stream capability the streamrelay transfer engine consumes, plus the
//! concrete source/sink kinds its constructor matrix builds: in-memory
//! buffers, files, and pre-built or `mio`-driven network handles.

mod error;
mod file;
mod handle;
mod memory;
mod mode;
mod net;
mod stream;
mod url;

pub use error::StreamError;
pub use file::{FileOptions, FileStream};
pub use handle::HandleStream;
pub use memory::MemoryStream;
pub use mode::{StreamMode, WaitFor};
pub use net::NonBlockingStream;
pub use stream::{PollableStream, Stream};
pub use url::stream_from_url;
