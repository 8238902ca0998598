use std::collections::HashMap;
use std::os::fd::RawFd;

use crate::device_file;
use crate::entry::FieldValue;
use crate::error::{Error, Result};
use crate::wire_format::WireCursor;

/// Pluggable decoders for wire fields beyond the base format.
///
/// Distinct device revisions add distinct trailing fields after the fixed
/// header in an order-dependent, cumulative way. One revision appends an
/// effective user ID, a vendor kernel variant prepends a timezone field.
/// An extension chain lets a reader be configured per deployment without
/// touching the base codec.

/// The extended wire revision carrying an effective user ID per record.
///
/// The base revision needs no constant: an empty chain never negotiates.
pub const ABI_V2: i32 = 2;

/// A decoder for one additional wire field block.
///
/// Extensions run between the fixed header and the base payload. Each
/// consumes exactly the bytes of its own fields from the shared cursor.
pub trait AbiExtension {
    /// Construction-time hook, called once with the open device handle
    /// before any record is read.
    ///
    /// Extensions that require the facility to emit their fields negotiate
    /// that here, typically with an out-of-band control request. The
    /// default does nothing. If this fails, reader construction fails; a
    /// reader never silently falls back to the base format once extended
    /// fields were requested.
    fn prepare(&self, fd: RawFd) -> Result<()> {
        let _ = fd;
        Ok(())
    }

    /// Decodes this extension's fields from the cursor.
    ///
    /// Returns the decoded fields keyed by name. Must consume exactly the
    /// bytes belonging to this extension so that the next one in the chain
    /// starts at the right offset.
    fn read(&self, cursor: &mut WireCursor<'_>) -> Result<HashMap<String, FieldValue>>;
}

/// An ordered chain of [`AbiExtension`]s applied to every record.
///
/// The chain calls each extension in registration order against the same
/// advancing cursor and merges their results into one map. On a key
/// collision the later extension wins; duplicate keys are a merge, not an
/// error. An empty chain consumes nothing, which decodes the classic wire
/// format unchanged.
#[derive(Default)]
pub struct ChainedAbiExtension {
    extensions: Vec<Box<dyn AbiExtension + Send>>,
}

impl ChainedAbiExtension {
    /// Creates an empty chain, equivalent to "no extension fields".
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an extension to the end of the chain and returns the chain.
    pub fn with(mut self, ext: impl AbiExtension + Send + 'static) -> Self {
        self.extensions.push(Box::new(ext));
        self
    }

    /// True if no extensions are registered.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Runs every extension's negotiation hook against the open handle.
    ///
    /// The first failure aborts and surfaces as-is.
    pub fn prepare(&self, fd: RawFd) -> Result<()> {
        for ext in &self.extensions {
            ext.prepare(fd)?;
        }
        Ok(())
    }

    /// Reads all extension fields from the cursor, merging the results.
    ///
    /// If any extension fails, the chain aborts immediately and the error
    /// is surfaced wrapped in [`Error::ExtensionDecodeFailed`]; no attempt
    /// is made to skip the failing extension or fall back to a shorter
    /// format.
    pub fn read(&self, cursor: &mut WireCursor<'_>) -> Result<HashMap<String, FieldValue>> {
        let mut merged = HashMap::new();

        for ext in &self.extensions {
            match ext.read(cursor) {
                Ok(fields) => merged.extend(fields),
                Err(err) => return Err(Error::ExtensionDecodeFailed(Box::new(err))),
            }
        }

        Ok(merged)
    }
}

/// The wire-revision-2 extension: one effective user ID per record.
///
/// Negotiates revision [`ABI_V2`] with the facility at reader construction
/// and decodes the little-endian `u32` the facility then places directly
/// after the fixed header. The field is reported under the key `"euid"`,
/// which the reader also lifts into [`Entry::euid`](crate::Entry::euid).
pub struct EuidAbiExtension;

impl AbiExtension for EuidAbiExtension {
    fn prepare(&self, fd: RawFd) -> Result<()> {
        device_file::set_abi_version(fd, ABI_V2)
    }

    fn read(&self, cursor: &mut WireCursor<'_>) -> Result<HashMap<String, FieldValue>> {
        let euid = cursor.read_u32()?;
        Ok(HashMap::from([(
            String::from("euid"),
            FieldValue::U32(euid),
        )]))
    }
}

/// Vendor quirk extension: a timezone field preceding the payload.
///
/// Certain vendor kernels ship a logger that inserts a signed 32-bit
/// timezone value into every record. The field is reported under the key
/// `"tz"`. No negotiation is needed, the vendor facility always emits it.
pub struct TimezoneAbiExtension;

impl AbiExtension for TimezoneAbiExtension {
    fn read(&self, cursor: &mut WireCursor<'_>) -> Result<HashMap<String, FieldValue>> {
        let tz = cursor.read_i32()?;
        Ok(HashMap::from([(String::from("tz"), FieldValue::I32(tz))]))
    }
}
