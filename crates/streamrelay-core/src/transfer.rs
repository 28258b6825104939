use std::{
    collections::HashMap,
    io,
    time::Duration as StdDuration,
};

use mio::{Events, Interest, Poll, Token};
use streamrelay_io::{
    FileOptions, FileStream, HandleStream, MemoryStream, PollableStream, Stream, WaitFor,
    stream_from_url,
};
use streamrelay_timing::Duration;

use crate::{
    controller::{Controller, StepOutcome},
    error::{CallbackState, TransferError},
    flags::{Flags, TransferHandle},
    reporter::Report,
};

/// Either side of a transfer: a stream driven inline (blocking I/O returns
/// directly) or one driven by readiness events (`mio`). Implementing
/// [`Stream`] by forwarding lets [`crate::controller::Controller`] stay
/// ignorant of which kind it's holding, so the governor and reporter run
/// identically either way and only the driving loop differs.
enum Endpoint {
    Blocking(Box<dyn Stream>),
    Async(Box<dyn PollableStream>),
}

impl Endpoint {
    fn as_stream_mut(&mut self) -> &mut dyn Stream {
        match self {
            Endpoint::Blocking(s) => s.as_mut(),
            Endpoint::Async(s) => s.as_mut() as &mut dyn Stream,
        }
    }

    fn as_stream(&self) -> &dyn Stream {
        match self {
            Endpoint::Blocking(s) => s.as_ref(),
            Endpoint::Async(s) => s.as_ref() as &dyn Stream,
        }
    }

    fn is_async(&self) -> bool {
        matches!(self, Endpoint::Async(_))
    }

    fn register(&mut self, registry: &mio::Registry, token: Token, interest: Interest) -> io::Result<()> {
        match self {
            Endpoint::Blocking(_) => Ok(()),
            Endpoint::Async(s) => s.register(registry, token, interest),
        }
    }

    fn reregister(&mut self, registry: &mio::Registry, token: Token, interest: Interest) -> io::Result<()> {
        match self {
            Endpoint::Blocking(_) => Ok(()),
            Endpoint::Async(s) => s.reregister(registry, token, interest),
        }
    }

    fn deregister(&mut self, registry: &mio::Registry) -> io::Result<()> {
        match self {
            Endpoint::Blocking(_) => Ok(()),
            Endpoint::Async(s) => s.deregister(registry),
        }
    }
}

const INPUT_TOKEN: Token = Token(0);
const OUTPUT_TOKEN: Token = Token(1);

/// A single source-to-sink copy with rate limiting, pause/resume, kill, and
/// progress reporting.
///
/// Construct one of the eight source/sink combinations — every pairing of
/// handle, URL, and in-memory buffer except buffer-to-buffer, which needs
/// no transfer engine — then drive it with [`Transfer::save_sync`] or
/// [`Transfer::save_async`] depending on which flavor the streams were
/// built for.
pub struct Transfer {
    input: Endpoint,
    output: Endpoint,
    start_offset: u64,
    flags: std::sync::Arc<Flags>,
}

impl Transfer {
    fn new(input: Endpoint, output: Endpoint, rate_limit: u64) -> Self {
        Self { input, output, start_offset: 0, flags: Flags::new(rate_limit) }
    }

    /// Seeks the input stream to `offset` before the first read, once
    /// `open()` runs. Left at the default of 0, this is a no-op and the
    /// transfer starts from wherever the stream already is.
    pub fn with_start_offset(mut self, offset: u64) -> Self {
        self.start_offset = offset;
        self
    }

    // -- constructor matrix --------------------------------------------

    /// A pre-built handle to a pre-built handle.
    pub fn handle_to_handle(source: Box<dyn Stream>, sink: Box<dyn Stream>, rate_limit: u64) -> Self {
        Self::new(Endpoint::Blocking(source), Endpoint::Blocking(sink), rate_limit)
    }

    /// A pre-built handle to a URL sink.
    pub fn handle_to_url(source: Box<dyn Stream>, sink_url: &str, rate_limit: u64) -> Result<Self, TransferError> {
        let sink = stream_from_url(sink_url, true)?;
        Ok(Self::new(Endpoint::Blocking(source), Endpoint::Blocking(sink), rate_limit))
    }

    /// A URL source to a pre-built handle.
    pub fn url_to_handle(source_url: &str, sink: Box<dyn Stream>, rate_limit: u64) -> Result<Self, TransferError> {
        let source = stream_from_url(source_url, false)?;
        Ok(Self::new(Endpoint::Blocking(source), Endpoint::Blocking(sink), rate_limit))
    }

    /// A URL source to a URL sink.
    pub fn url_to_url(source_url: &str, sink_url: &str, rate_limit: u64) -> Result<Self, TransferError> {
        let source = stream_from_url(source_url, false)?;
        let sink = stream_from_url(sink_url, true)?;
        Ok(Self::new(Endpoint::Blocking(source), Endpoint::Blocking(sink), rate_limit))
    }

    /// A pre-built handle to an in-memory buffer.
    pub fn handle_to_buffer(source: Box<dyn Stream>, rate_limit: u64) -> Self {
        Self::new(Endpoint::Blocking(source), Endpoint::Blocking(Box::new(MemoryStream::sink())), rate_limit)
    }

    /// An in-memory buffer to a pre-built handle.
    pub fn buffer_to_handle(source: Vec<u8>, sink: Box<dyn Stream>, rate_limit: u64) -> Self {
        Self::new(Endpoint::Blocking(Box::new(MemoryStream::from_bytes(source))), Endpoint::Blocking(sink), rate_limit)
    }

    /// A URL source to an in-memory buffer.
    pub fn url_to_buffer(source_url: &str, rate_limit: u64) -> Result<Self, TransferError> {
        let source = stream_from_url(source_url, false)?;
        Ok(Self::new(Endpoint::Blocking(source), Endpoint::Blocking(Box::new(MemoryStream::sink())), rate_limit))
    }

    /// An in-memory buffer to a URL sink.
    pub fn buffer_to_url(source: Vec<u8>, sink_url: &str, rate_limit: u64) -> Result<Self, TransferError> {
        let sink = stream_from_url(sink_url, true)?;
        Ok(Self::new(Endpoint::Blocking(Box::new(MemoryStream::from_bytes(source))), Endpoint::Blocking(sink), rate_limit))
    }

    /// A convenience pair over plain file paths, since this is the most
    /// common CLI invocation (see `streamrelay-cli`).
    pub fn file_to_file(source: impl Into<std::path::PathBuf>, sink: impl Into<std::path::PathBuf>, rate_limit: u64) -> Self {
        let source: Box<dyn Stream> = Box::new(FileStream::new(source.into(), FileOptions::source()));
        let sink: Box<dyn Stream> = Box::new(FileStream::new(sink.into(), FileOptions::sink()));
        Self::handle_to_handle(source, sink, rate_limit)
    }

    /// The non-blocking flavor: both ends are already-connected `mio`
    /// sources, driven by [`Transfer::save_async`]. Unlike the blocking
    /// matrix above, this has no URL/buffer variants — non-blocking I/O
    /// is only meaningful for socket-like handles.
    pub fn from_async_handles(
        source: Box<dyn PollableStream>,
        sink: Box<dyn PollableStream>,
        rate_limit: u64,
    ) -> Self {
        Self::new(Endpoint::Async(source), Endpoint::Async(sink), rate_limit)
    }

    // -- lifecycle -------------------------------------------------------

    /// A cloneable remote control for `pause`/`resume`/`kill`/`limit` from
    /// another thread.
    pub fn handle(&self) -> TransferHandle {
        TransferHandle::new(self.flags.clone())
    }

    pub fn pause(&self) {
        self.handle().pause();
    }

    pub fn resume(&self) -> Result<(), TransferError> {
        self.handle().resume()
    }

    pub fn kill(&self) {
        self.handle().kill();
    }

    pub fn limit(&self, bytes_per_sec: u64) {
        self.handle().limit(bytes_per_sec);
    }

    /// Opens both streams and reports the result through `cb`, mirroring
    /// the save callback's `Ok`/`Io(..)` vocabulary. Follows the state
    /// machine's `OPENING_OSTREAM` then `SEEKING_ISTREAM` order: the sink
    /// opens first, then the source opens and seeks to `start_offset`.
    pub fn open<F: FnOnce(CallbackState) -> bool>(&mut self, cb: F) -> Result<(), TransferError> {
        use std::sync::atomic::Ordering;

        if self.flags.opened.load(Ordering::Acquire) {
            return Err(TransferError::AlreadyOpened);
        }
        if let Err(e) = self.output.as_stream_mut().open() {
            cb(CallbackState::from(&e));
            return Err(TransferError::Io(e));
        }
        if let Err(e) = self.input.as_stream_mut().open() {
            let _ = self.output.as_stream_mut().close();
            cb(CallbackState::from(&e));
            return Err(TransferError::Io(e));
        }
        if self.start_offset > 0 {
            if let Err(e) = self.input.as_stream_mut().seek(self.start_offset) {
                let _ = self.input.as_stream_mut().close();
                let _ = self.output.as_stream_mut().close();
                cb(CallbackState::from(&e));
                return Err(TransferError::Io(e));
            }
        }
        self.flags.opened.store(true, Ordering::Release);
        cb(CallbackState::Ok);
        Ok(())
    }

    /// Kills, then closes both streams. Idempotent; safe to call whether or
    /// not the transfer ever completed. Pass `bcalling=true` when calling
    /// from inside the save callback itself — the controller has already
    /// observed (or is about to observe) `stopped` on this same step, so
    /// re-entering `kill`'s flag dance here is redundant and, in an
    /// event-loop-based implementation, exactly the kind of re-entrant call
    /// into the running step that could deadlock; `false` from any other
    /// context.
    pub fn close(&mut self, bcalling: bool) -> io::Result<()> {
        if !bcalling {
            self.kill();
        }
        let a = self.input.as_stream_mut().close();
        let b = self.output.as_stream_mut().close();
        a.and(b)
    }

    /// Closes, then releases owned streams. There's no separate ownership
    /// table to consult here — the streams are owned by value inside
    /// `Transfer` regardless of how they were constructed, so "release" is
    /// just letting them drop along with `self` once the caller is done.
    /// `bcalling` is forwarded to `close` unchanged.
    pub fn exit(&mut self, bcalling: bool) -> io::Result<()> {
        self.close(bcalling)
    }

    /// Opens the transfer if it isn't already open, routing an open
    /// failure through `callback` as a terminal report (`osave` only takes
    /// the one save callback, so there's nowhere else for it to go) rather
    /// than through the separate open callback `open()` itself accepts.
    /// Returns `Err` without touching `callback` again if the transfer was
    /// already open and in some other non-startable state (e.g. stopped);
    /// `save_sync`/`save_async` report that the usual way.
    fn open_or_report<F>(&mut self, callback: &mut F) -> Result<(), TransferError>
    where
        F: FnMut(CallbackState, Report) -> bool,
    {
        use std::sync::atomic::Ordering;

        if self.flags.opened.load(Ordering::Acquire) {
            return Ok(());
        }
        if let Err(e) = self.open(|_| true) {
            let state = match &e {
                TransferError::Io(io_err) => CallbackState::from(io_err),
                _ => CallbackState::UnknownError,
            };
            let report = Report {
                input_offset: self.input.as_stream().offset(),
                input_size: self.input.as_stream().size(),
                saved_total: 0,
                rate: 0,
            };
            callback(state, report);
            return Err(e);
        }
        Ok(())
    }

    /// `open()` if necessary, then [`Transfer::save_sync`]. Mirrors the
    /// original's `osave` (open-then-save) convenience constructor.
    pub fn osave_sync<F>(&mut self, mut callback: F) -> Result<(), TransferError>
    where
        F: FnMut(CallbackState, Report) -> bool,
    {
        self.open_or_report(&mut callback)?;
        self.save_sync(callback)
    }

    /// `open()` if necessary, then [`Transfer::save_async`].
    pub fn osave_async<F>(&mut self, mut callback: F) -> Result<(), TransferError>
    where
        F: FnMut(CallbackState, Report) -> bool,
    {
        self.open_or_report(&mut callback)?;
        self.save_async(callback)
    }

    // -- driving ----------------------------------------------------------

    /// Checks preconditions shared by both `save` flavors and emits the
    /// first report. Returns `true` if the caller should enter the
    /// read/write loop, `false` if the init call itself was rejected (the
    /// terminal report already fired and the loop must not start).
    fn start<F>(&mut self, controller: &mut Controller<F>) -> Result<bool, TransferError>
    where
        F: FnMut(CallbackState, Report) -> bool,
    {
        use std::sync::atomic::Ordering;

        if !self.flags.opened.load(Ordering::Acquire) {
            return Err(TransferError::NotOpened);
        }
        if self.flags.stopped.load(Ordering::Acquire) {
            return Err(TransferError::Stopped);
        }
        if controller.emit_first(self.input.as_stream()) {
            Ok(true)
        } else {
            controller.reject_first(self.input.as_stream());
            Ok(false)
        }
    }

    /// The blocking flavor of `save`: a single call that drives the whole
    /// transfer to completion, sleeping the calling thread for rate-limit
    /// delays and spin-waiting (with a short backoff) while paused.
    pub fn save_sync<F>(&mut self, callback: F) -> Result<(), TransferError>
    where
        F: FnMut(CallbackState, Report) -> bool,
    {
        let mut controller = Controller::new(self.flags.clone(), callback);
        if !self.start(&mut controller)? {
            return Ok(());
        }

        loop {
            match controller.step(self.input.as_stream_mut(), self.output.as_stream_mut()) {
                StepOutcome::Continue => continue,
                StepOutcome::WaitOn(which) => {
                    let stream = match which {
                        WaitFor::Readable => self.input.as_stream_mut(),
                        WaitFor::Writable => self.output.as_stream_mut(),
                    };
                    let _ = stream.wait(which, StdDuration::from_millis(50));
                }
                StepOutcome::Sleep(delay) => std::thread::sleep(StdDuration::from_millis(delay.as_millis())),
                StepOutcome::Paused => self.wait_out_pause(),
                StepOutcome::Done(_) => return Ok(()),
            }
        }
    }

    /// The paused transfer suspends the read/write cycle until `resume()`
    /// clears `paused` or `kill()` sets `stopped`; both are plain atomics,
    /// so a short sleep-and-recheck loop is sufficient — pause/resume are
    /// rare compared to the byte cadence of the transfer itself, so there's
    /// no dedicated condvar here.
    fn wait_out_pause(&self) {
        use std::sync::atomic::Ordering;

        while self.flags.paused.load(Ordering::Acquire) && !self.flags.stopped.load(Ordering::Acquire) {
            std::thread::sleep(StdDuration::from_millis(10));
        }
    }

    /// The non-blocking, completion-driven flavor of `save`: drives the
    /// same [`Controller`] state machine, but waits for `mio` readiness
    /// events instead of blocking directly inside a stream's `read`/
    /// `write`. This crate doesn't pull in an async executor — "async"
    /// here means non-blocking I/O driven by a readiness loop, not
    /// `async`/`await` futures.
    pub fn save_async<F>(&mut self, callback: F) -> Result<(), TransferError>
    where
        F: FnMut(CallbackState, Report) -> bool,
    {
        let mut controller = Controller::new(self.flags.clone(), callback);
        if !self.start(&mut controller)? {
            return Ok(());
        }

        let mut poll = Poll::new().map_err(TransferError::Io)?;
        self.input.register(poll.registry(), INPUT_TOKEN, Interest::READABLE).map_err(TransferError::Io)?;
        self.output.register(poll.registry(), OUTPUT_TOKEN, Interest::WRITABLE).map_err(TransferError::Io)?;
        let mut armed: HashMap<Token, Interest> =
            HashMap::from([(INPUT_TOKEN, Interest::READABLE), (OUTPUT_TOKEN, Interest::WRITABLE)]);
        let mut events = Events::with_capacity(8);

        let result = loop {
            match controller.step(self.input.as_stream_mut(), self.output.as_stream_mut()) {
                StepOutcome::Continue => continue,
                StepOutcome::WaitOn(which) => {
                    let (endpoint, token, interest) = match which {
                        WaitFor::Readable => (&mut self.input, INPUT_TOKEN, Interest::READABLE),
                        WaitFor::Writable => (&mut self.output, OUTPUT_TOKEN, Interest::WRITABLE),
                    };
                    if endpoint.is_async() && armed.get(&token) != Some(&interest) {
                        endpoint.reregister(poll.registry(), token, interest).map_err(TransferError::Io)?;
                        armed.insert(token, interest);
                    }
                    if let Err(e) = poll.poll(&mut events, Some(StdDuration::from_millis(250))) {
                        if e.kind() != io::ErrorKind::Interrupted {
                            break Err(TransferError::Io(e));
                        }
                    }
                }
                StepOutcome::Sleep(delay) => std::thread::sleep(StdDuration::from_millis(delay.as_millis())),
                StepOutcome::Paused => {
                    self.wait_out_pause();
                }
                StepOutcome::Done(_) => break Ok(()),
            }
        };

        let _ = self.input.deregister(poll.registry());
        let _ = self.output.deregister(poll.registry());
        result
    }
}
