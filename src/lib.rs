//! # devlog
//!
//! A client library for kernel-exposed, append-only, multi-stream log
//! devices. Producers append tagged, prioritized text entries to one of
//! several named streams; consumers read entries back as they arrive,
//! with per-call read deadlines.
//!
//! ## Key Properties
//!
//! * One vectored write per entry, stored atomically by the facility
//! * Entries are stamped with pid, tid and timestamp on ingestion, never
//!   by the writer
//! * Blocking reads with caller-controlled deadlines; timeout is the only
//!   way the device reports "no data"
//! * Extensible wire format: optional per-deployment ABI extensions decode
//!   additional record fields
//!
//! ## Main Components
//!
//! * [`DeviceWriter`]: sends entries to a stream (one atomic record per write)
//! * [`DeviceReader`]: reads entries back, decoding the wire format
//! * [`ChainedAbiExtension`]: ordered decoders for extended wire revisions
//! * [`LogRoot`]: maps [`LogId`]s to device paths and opens handles
//! * [`DeviceLog`]: routes the [`log`] facade into a stream
//!
//! ## Writing Entries
//!
//! ```no_run
//! use devlog::{LogId, LogRoot, Priority, Tag, Writer};
//!
//! # fn main() -> devlog::Result<()> {
//! let writer = LogRoot::default().writer(LogId::Main)?;
//! writer.write(Priority::Debug, &Tag::from("A funky tag"), "42")?;
//!
//! // Or through the per-priority helpers.
//! writer.d(&Tag::from("A funky tag"), "42")?;
//! writer.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Reading Entries
//!
//! ```no_run
//! use std::time::{Duration, Instant};
//! use devlog::{ChainedAbiExtension, LogId, LogRoot, Reader};
//!
//! # fn main() -> devlog::Result<()> {
//! let mut reader = LogRoot::default().reader(LogId::Main, ChainedAbiExtension::new())?;
//!
//! reader.set_deadline(Some(Instant::now() + Duration::from_millis(500)));
//! while let Ok(entry) = reader.read_next() {
//!     println!("{}/{}({}): {}", entry.priority, entry.tag, entry.pid, entry.message);
//!     reader.set_deadline(Some(Instant::now() + Duration::from_millis(500)));
//! }
//! # Ok(())
//! # }
//! ```

pub mod abi_extension;
pub mod device_file;
pub mod entry;
pub mod error;
pub mod log_bridge;
pub mod reader;
pub mod streams;
pub mod wire_format;
pub mod writer;

pub use abi_extension::{
    AbiExtension, ChainedAbiExtension, EuidAbiExtension, TimezoneAbiExtension, ABI_V2,
};
pub use entry::{Entry, FieldValue, LogId, Priority, Tag, Timestamp};
pub use error::{Error, Result};
pub use log_bridge::DeviceLog;
pub use reader::{CloseHandle, DeviceReader, Reader};
pub use streams::{LogRoot, DEFAULT_LOG_ROOT};
pub use wire_format::{decode_entry, encode_segments, HEADER_SIZE, MAX_ENTRY_SIZE};
pub use writer::{DeviceWriter, Writer};
