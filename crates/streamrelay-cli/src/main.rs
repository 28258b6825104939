//! A thin control binary over the `streamrelay-core`/`streamrelay-io`
//! library crates: copy a file, URL, or buffer to another with an optional
//! rate limit, printing progress as the transfer's own save callback fires.
//! A control surface, not part of the engine contract.

use std::{
    io::{self, IsTerminal, Write as _},
    process::ExitCode,
    sync::atomic::{AtomicBool, Ordering},
    time::Instant as StdInstant,
};

use clap::Parser;
use streamrelay_core::{CallbackState, Transfer};
use streamrelay_io::{FileOptions, FileStream};

/// Copy bytes from one stream to another under an optional rate limit.
#[derive(Debug, Parser)]
#[command(name = "streamrelay", version, about)]
struct Args {
    /// Source file path.
    source: String,

    /// Destination file path.
    sink: String,

    /// Byte-per-second ceiling, e.g. "2MiB", "512KiB". Omit for unlimited.
    #[arg(long, value_parser = parse_rate)]
    rate_limit: Option<u64>,

    /// Byte offset into the source to start reading from.
    #[arg(long, default_value_t = 0)]
    start_offset: u64,

    /// Suppress the progress line.
    #[arg(long)]
    quiet: bool,
}

fn parse_rate(s: &str) -> Result<u64, String> {
    let lower = s.to_ascii_lowercase();
    let (digits, mult): (&str, u64) = if let Some(n) = lower.strip_suffix("kib") {
        (n, 1024)
    } else if let Some(n) = lower.strip_suffix("mib") {
        (n, 1024 * 1024)
    } else if let Some(n) = lower.strip_suffix("gib") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = lower.strip_suffix('k') {
        (n, 1000)
    } else if let Some(n) = lower.strip_suffix('m') {
        (n, 1_000_000)
    } else {
        (lower.as_str(), 1)
    };
    digits.trim().parse::<u64>().map(|n| n * mult).map_err(|e| e.to_string())
}

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    if let Err(e) = ctrlc::set_handler(|| {
        tracing::info!("received interrupt, killing transfer");
        INTERRUPTED.store(true, Ordering::Release);
    }) {
        tracing::warn!(error = %e, "failed to install ctrl-c handler; kill() on SIGINT disabled");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("streamrelay: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let source = FileStream::new(&args.source, FileOptions::source());
    let sink = FileStream::new(&args.sink, FileOptions::sink());

    let mut transfer = Transfer::handle_to_handle(
        Box::new(source),
        Box::new(sink),
        args.rate_limit.unwrap_or(0),
    )
    .with_start_offset(args.start_offset);
    let handle = transfer.handle();

    transfer.open(|state| {
        if state != CallbackState::Ok {
            eprintln!("streamrelay: open failed: {state:?}");
        }
        true
    })?;

    let quiet = args.quiet || !io::stdout().is_terminal();
    let started = StdInstant::now();
    let final_state = std::cell::Cell::new(CallbackState::Ok);

    transfer.save_sync(|state, report| {
        if INTERRUPTED.load(Ordering::Acquire) {
            handle.kill();
        }
        if !quiet {
            print_progress(state, report.saved_total, report.input_size, report.rate);
        }
        if state.is_terminal() {
            final_state.set(state);
        }
        true
    })?;

    if !quiet {
        println!();
    }
    tracing::info!(elapsed = ?started.elapsed(), state = ?final_state.get(), "transfer finished");

    match final_state.get() {
        CallbackState::Closed => Ok(()),
        other => Err(format!("transfer ended with {other:?}").into()),
    }
}

fn print_progress(state: CallbackState, saved: u64, total: Option<u64>, rate: u64) {
    let mut stdout = io::stdout();
    let pct = total
        .filter(|&t| t > 0)
        .map(|t| format!("{:5.1}%", (saved as f64 / t as f64) * 100.0))
        .unwrap_or_else(|| "  ?  ".to_string());
    let _ = write!(stdout, "\r{state:?} {pct} {saved} bytes @ {rate} B/s    ");
    let _ = stdout.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_binary_rates() {
        assert_eq!(parse_rate("2048").unwrap(), 2048);
        assert_eq!(parse_rate("2KiB").unwrap(), 2048);
        assert_eq!(parse_rate("1MiB").unwrap(), 1024 * 1024);
        assert_eq!(parse_rate("2k").unwrap(), 2000);
    }

    #[test]
    fn rejects_garbage_rate() {
        assert!(parse_rate("fast").is_err());
    }
}
