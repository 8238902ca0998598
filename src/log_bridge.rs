use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};

use crate::entry::{Priority, Tag};
use crate::writer::{DeviceWriter, Writer};

/// Bridges the [`log`] facade onto a log stream.
///
/// Applications already instrumented with `log` macros can route their
/// records into a device stream under one fixed tag. Timestamps and code
/// locations are deliberately not rendered into the message, the facility
/// stamps every entry on ingestion.

/// Maps a `log` level onto the facility's priority scale.
pub fn priority_for(level: Level) -> Priority {
    match level {
        Level::Error => Priority::Error,
        Level::Warn => Priority::Warn,
        Level::Info => Priority::Info,
        Level::Debug => Priority::Debug,
        Level::Trace => Priority::Verbose,
    }
}

/// A [`log::Log`] implementation writing to one device stream.
///
/// # Examples
///
/// ```no_run
/// use devlog::{DeviceLog, LogId, LogRoot, Tag};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let writer = LogRoot::default().writer(LogId::Main)?;
/// DeviceLog::new(writer, Tag::from("my-app"))
///     .with_max_level(log::LevelFilter::Info)
///     .install()?;
///
/// log::info!("connected to the logging facility");
/// # Ok(())
/// # }
/// ```
pub struct DeviceLog {
    writer: DeviceWriter,
    tag: Tag,
    max_level: LevelFilter,
}

impl DeviceLog {
    /// Creates a bridge sending every record to `writer` under `tag`.
    ///
    /// All levels are enabled; restrict with
    /// [`with_max_level`](DeviceLog::with_max_level).
    pub fn new(writer: DeviceWriter, tag: Tag) -> DeviceLog {
        DeviceLog {
            writer,
            tag,
            max_level: LevelFilter::Trace,
        }
    }

    /// Caps the levels this bridge forwards.
    pub fn with_max_level(mut self, max_level: LevelFilter) -> DeviceLog {
        self.max_level = max_level;
        self
    }

    /// Installs the bridge as the process-wide `log` backend.
    pub fn install(self) -> Result<(), SetLoggerError> {
        log::set_max_level(self.max_level);
        log::set_boxed_logger(Box::new(self))
    }
}

impl log::Log for DeviceLog {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.max_level
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // The facade offers no error channel; a failed write is dropped.
        let message = record.args().to_string();
        let _ = self
            .writer
            .write(priority_for(record.level()), &self.tag, &message);
    }

    fn flush(&self) {}
}
