use std::path::PathBuf;

use crate::abi_extension::ChainedAbiExtension;
use crate::entry::LogId;
use crate::error::Result;
use crate::reader::DeviceReader;
use crate::writer::DeviceWriter;

/// Factory for handles onto the facility's well-known streams.

/// Where the facility exposes its device nodes.
pub const DEFAULT_LOG_ROOT: &str = "/dev/alog";

/// Maps stream ids to device paths and opens readers and writers on them.
///
/// Handles are constructed explicitly and owned by whoever asked for them;
/// there is no process-global writer state. A non-default root is mostly
/// useful for tests and for systems that mount the facility elsewhere.
///
/// # Examples
///
/// ```no_run
/// use devlog::{LogId, LogRoot, Priority, Tag, Writer};
///
/// # fn main() -> devlog::Result<()> {
/// let root = LogRoot::default();
/// let main = root.writer(LogId::Main)?;
/// main.write(Priority::Info, &Tag::from("boot"), "facility reachable")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LogRoot {
    root: PathBuf,
}

impl Default for LogRoot {
    fn default() -> Self {
        LogRoot {
            root: PathBuf::from(DEFAULT_LOG_ROOT),
        }
    }
}

impl LogRoot {
    /// Uses `root` as the directory holding the stream device nodes.
    pub fn new(root: impl Into<PathBuf>) -> LogRoot {
        LogRoot { root: root.into() }
    }

    /// The device path for stream `id`, `<root>/<name>`.
    pub fn path(&self, id: LogId) -> PathBuf {
        self.root.join(id.name())
    }

    /// Opens stream `id` for writing.
    pub fn writer(&self, id: LogId) -> Result<DeviceWriter> {
        DeviceWriter::open(&self.path(id))
    }

    /// Opens stream `id` for reading with the given extension chain.
    pub fn reader(&self, id: LogId, chain: ChainedAbiExtension) -> Result<DeviceReader> {
        DeviceReader::open(&self.path(id), id, chain)
    }
}
