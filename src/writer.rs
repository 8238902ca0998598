use std::io;
use std::path::Path;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::debug;

use crate::device_file::DeviceFile;
use crate::entry::{Priority, Tag};
use crate::error::{Error, Result};
use crate::wire_format::encode_segments;

/// Writing entries to a log stream.

/// The writing half of the device contract.
///
/// Implementations send one tagged, prioritized message per call. The
/// per-priority convenience methods are one-line forwarders onto
/// [`write`](Writer::write).
///
/// # Examples
///
/// ```no_run
/// use devlog::{LogId, LogRoot, Priority, Tag, Writer};
///
/// # fn main() -> devlog::Result<()> {
/// let writer = LogRoot::default().writer(LogId::Main)?;
/// writer.write(Priority::Debug, &Tag::from("A funky tag"), "42")?;
/// writer.d(&Tag::from("A funky tag"), "42")?;
/// writer.close()?;
/// # Ok(())
/// # }
/// ```
pub trait Writer {
    /// Logs `message` under `tag` with priority `priority`.
    ///
    /// Returns an error if writing to the underlying facility fails.
    fn write(&self, priority: Priority, tag: &Tag, message: &str) -> Result<()>;

    /// Adjusts the write deadline.
    ///
    /// Part of the capability contract shared with readers so the two can
    /// be driven polymorphically; device writers never need one.
    fn set_deadline(&self, deadline: Option<Instant>) -> Result<()>;

    /// Releases the underlying handle. A writer is closed exactly once by
    /// its owner; operations after that fail with [`Error::Closed`].
    fn close(&self) -> Result<()>;

    /// Logs `message` under `tag` with priority Verbose.
    fn v(&self, tag: &Tag, message: &str) -> Result<()> {
        self.write(Priority::Verbose, tag, message)
    }

    /// Logs `message` under `tag` with priority Debug.
    fn d(&self, tag: &Tag, message: &str) -> Result<()> {
        self.write(Priority::Debug, tag, message)
    }

    /// Logs `message` under `tag` with priority Info.
    fn i(&self, tag: &Tag, message: &str) -> Result<()> {
        self.write(Priority::Info, tag, message)
    }

    /// Logs `message` under `tag` with priority Warn.
    fn w(&self, tag: &Tag, message: &str) -> Result<()> {
        self.write(Priority::Warn, tag, message)
    }

    /// Logs `message` under `tag` with priority Error.
    fn e(&self, tag: &Tag, message: &str) -> Result<()> {
        self.write(Priority::Error, tag, message)
    }

    /// Logs `message` under `tag` with priority Fatal.
    fn f(&self, tag: &Tag, message: &str) -> Result<()> {
        self.write(Priority::Fatal, tag, message)
    }
}

/// A [`Writer`] backed by one open log device handle.
///
/// Every call to [`write`](Writer::write) encodes the record into three
/// segments and hands them to a single vectored write, which the facility
/// stores as one atomic record, stamping pid, tid and timestamp itself.
/// Writes never block waiting for readers.
///
/// The handle is guarded by an internal mutex, so a DeviceWriter can be
/// shared between threads without external serialization.
pub struct DeviceWriter {
    // None once closed; the handle is released at close, not at drop.
    dev: Mutex<Option<DeviceFile>>,
}

impl DeviceWriter {
    /// Opens the log device at `path` for writing.
    ///
    /// Fails with [`Error::StreamUnavailable`] if the device is absent or
    /// not accessible.
    pub fn open(path: &Path) -> Result<DeviceWriter> {
        let dev = DeviceFile::open_write(path)?;
        debug!(path = %path.display(), "opened log stream for writing");
        Ok(DeviceWriter {
            dev: Mutex::new(Some(dev)),
        })
    }
}

impl Writer for DeviceWriter {
    fn write(&self, priority: Priority, tag: &Tag, message: &str) -> Result<()> {
        let segments = encode_segments(priority, tag, message)?;

        let guard = self.dev.lock();
        let dev = guard.as_ref().ok_or(Error::Closed)?;
        let written = dev.write_vectored(&segments.as_slices())?;
        if written != segments.len() {
            return Err(Error::WriteFailed(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {} of {} bytes", written, segments.len()),
            )));
        }
        Ok(())
    }

    /// No-op: the facility always reports the device as writable, so
    /// polling before a write would be pointless.
    fn set_deadline(&self, _deadline: Option<Instant>) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        match self.dev.lock().take() {
            Some(dev) => {
                drop(dev);
                Ok(())
            }
            None => Err(Error::Closed),
        }
    }
}
