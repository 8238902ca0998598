use std::os::fd::AsRawFd;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::abi_extension::ChainedAbiExtension;
use crate::device_file::DeviceFile;
use crate::entry::{Entry, LogId};
use crate::error::Result;
use crate::wire_format::{decode_entry, MAX_ENTRY_SIZE};

/// Reading entries back from a log stream.

/// The reading half of the device contract.
///
/// Deadlines do not auto-renew: a read loop re-arms the deadline between
/// calls, treating [`Error::ReadTimeout`](crate::Error::ReadTimeout) as
/// the routine "nothing arrived in time" case.
///
/// # Examples
///
/// ```no_run
/// use std::time::{Duration, Instant};
/// use devlog::{ChainedAbiExtension, LogId, LogRoot, Reader};
///
/// # fn main() -> devlog::Result<()> {
/// let mut reader = LogRoot::default().reader(LogId::Main, ChainedAbiExtension::new())?;
///
/// // Keep reading until the stream stays quiet for half a second.
/// reader.set_deadline(Some(Instant::now() + Duration::from_millis(500)));
/// while let Ok(entry) = reader.read_next() {
///     println!("{}/{}({}): {}", entry.priority, entry.tag, entry.pid, entry.message);
///     reader.set_deadline(Some(Instant::now() + Duration::from_millis(500)));
/// }
/// # Ok(())
/// # }
/// ```
pub trait Reader {
    /// Adjusts the deadline for all subsequent reads.
    ///
    /// Once the instant passes, reads fail with
    /// [`Error::ReadTimeout`](crate::Error::ReadTimeout) regardless of
    /// whether data arrives later. `None` removes the bound.
    fn set_deadline(&mut self, deadline: Option<Instant>);

    /// Reads and decodes the next entry.
    ///
    /// Blocks until a record is available or the active deadline elapses.
    /// Each call drains at most one record; call repeatedly to catch up
    /// with a backlog.
    fn read_next(&mut self) -> Result<Entry>;
}

/// A [`Reader`] backed by one open log device handle.
///
/// Owns the handle, a reusable scratch buffer sized to the largest
/// possible record, and the ABI extension chain in effect for the stream.
/// Reading mutates the scratch buffer and the device cursor in place, so
/// `read_next` requires exclusive access; wrap the reader in a lock if two
/// threads must share it.
pub struct DeviceReader {
    id: LogId,
    dev: Arc<DeviceFile>,
    chain: ChainedAbiExtension,
    buf: Vec<u8>,
    deadline: Option<Instant>,
}

impl DeviceReader {
    /// Opens the log device at `path` for reading, as stream `id`, with
    /// the given extension chain.
    ///
    /// A non-empty chain negotiates its wire revision with the facility
    /// here, before the first read. If any extension's negotiation fails,
    /// construction fails; a reader never silently falls back to the base
    /// format when extended fields were requested.
    pub fn open(path: &Path, id: LogId, chain: ChainedAbiExtension) -> Result<DeviceReader> {
        let dev = DeviceFile::open_read(path)?;
        chain.prepare(dev.as_raw_fd())?;
        debug!(path = %path.display(), stream = %id, "opened log stream for reading");

        Ok(DeviceReader {
            id,
            dev: Arc::new(dev),
            chain,
            buf: vec![0; MAX_ENTRY_SIZE],
            deadline: None,
        })
    }

    /// Returns the stream this reader was opened on.
    pub fn id(&self) -> LogId {
        self.id
    }

    /// Returns a handle that can close this reader from another thread.
    pub fn close_handle(&self) -> CloseHandle {
        CloseHandle {
            dev: Arc::clone(&self.dev),
        }
    }

    /// Closes the reader.
    ///
    /// A read blocked in [`read_next`](Reader::read_next) unblocks and
    /// fails with [`Error::Closed`](crate::Error::Closed), as does every
    /// subsequent read.
    pub fn close(&self) -> Result<()> {
        self.dev.shutdown()
    }

    /// Discards every buffered entry in the stream.
    pub fn flush(&self) -> Result<()> {
        self.dev.flush_log()
    }

    /// Queries the total size of the stream's kernel buffer.
    pub fn log_buffer_size(&self) -> Result<usize> {
        self.dev.log_buffer_size()
    }

    /// Queries the length of the next unread entry.
    pub fn next_entry_len(&self) -> Result<usize> {
        self.dev.next_entry_len()
    }
}

impl Reader for DeviceReader {
    fn set_deadline(&mut self, deadline: Option<Instant>) {
        self.deadline = deadline;
    }

    fn read_next(&mut self) -> Result<Entry> {
        let n = self.dev.read_deadline(&mut self.buf, self.deadline)?;

        let mut entry = decode_entry(&self.buf[..n], &self.chain)?;
        entry.id = Some(self.id);
        Ok(entry)
    }
}

/// Closes a [`DeviceReader`] from outside the reading thread.
///
/// Obtained from [`DeviceReader::close_handle`]. Cloneable; all handles
/// refer to the same underlying device handle.
#[derive(Clone)]
pub struct CloseHandle {
    dev: Arc<DeviceFile>,
}

impl CloseHandle {
    /// Closes the associated reader, unblocking any read in flight.
    pub fn close(&self) -> Result<()> {
        self.dev.shutdown()
    }
}
