use std::env;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use devlog::{ChainedAbiExtension, LogId, LogRoot, Reader};

/// Dumps a log stream to stdout, one line per entry.
///
/// Usage: `devlog [-c] [stream]`. Reads the named stream (default "main")
/// until it stays quiet for half a second. With `-c` the stream is flushed
/// instead of read.

const READ_WINDOW: Duration = Duration::from_millis(500);

fn stream_by_name(name: &str) -> Option<LogId> {
    match name {
        "main" => Some(LogId::Main),
        "radio" => Some(LogId::Radio),
        "events" => Some(LogId::Events),
        "system" => Some(LogId::System),
        "crash" => Some(LogId::Crash),
        _ => None,
    }
}

fn main() -> ExitCode {
    let mut flush = false;
    let mut id = LogId::Main;

    for arg in env::args().skip(1) {
        match arg.as_str() {
            "-c" => flush = true,
            name => match stream_by_name(name) {
                Some(stream) => id = stream,
                None => {
                    eprintln!("devlog: unknown stream '{}'", name);
                    eprintln!("usage: devlog [-c] [main|radio|events|system|crash]");
                    return ExitCode::FAILURE;
                }
            },
        }
    }

    let mut reader = match LogRoot::default().reader(id, ChainedAbiExtension::new()) {
        Ok(reader) => reader,
        Err(err) => {
            eprintln!("devlog: {}", err);
            return ExitCode::FAILURE;
        }
    };

    if flush {
        return match reader.flush() {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("devlog: {}", err);
                ExitCode::FAILURE
            }
        };
    }

    loop {
        reader.set_deadline(Some(Instant::now() + READ_WINDOW));
        match reader.read_next() {
            Ok(entry) => {
                println!(
                    "{}/{}({}): {}",
                    entry.priority, entry.tag, entry.pid, entry.message
                );
            }
            // Quiet for a full window, we are caught up.
            Err(err) if err.is_timeout() => return ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("devlog: {}", err);
                return ExitCode::FAILURE;
            }
        }
    }
}
