use std::path::PathBuf;

use thiserror::Error;

/// Error taxonomy for the device codec and I/O layers.
///
/// Every failure surfaces to the immediate caller, nothing is downgraded
/// into a default value and nothing is retried internally. [`Error::ReadTimeout`]
/// is the one error a read loop treats as routine, all others are terminal
/// for the handle that produced them.

/// Result type for all devlog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by devlog readers, writers and the wire codec.
#[derive(Debug, Error)]
pub enum Error {
    /// Opening the device node for a stream failed, typically because the
    /// device is absent or permissions are insufficient.
    #[error("log stream at {path:?} is unavailable: {source}")]
    StreamUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The raw record was shorter than the fixed wire header.
    #[error("malformed record header")]
    MalformedHeader,

    /// The record payload was structurally invalid, for example too short
    /// to hold a priority and two terminators, or with field bounds that
    /// do not fit the buffer.
    #[error("invalid log entry")]
    InvalidEntry,

    /// An ABI extension failed to decode its portion of the record.
    #[error("ABI extension failed to decode: {0}")]
    ExtensionDecodeFailed(#[source] Box<Error>),

    /// An out-of-band control request on the device handle failed, for
    /// example the wire-revision negotiation issued at reader construction.
    #[error("device control request failed: {0}")]
    ControlRequestFailed(#[source] std::io::Error),

    /// The read deadline elapsed before a complete record arrived.
    #[error("reading the next entry from the log timed out")]
    ReadTimeout,

    /// Writing a record to the device failed.
    #[error("writing to the log device failed: {0}")]
    WriteFailed(#[source] std::io::Error),

    /// An unexpected I/O failure while reading from the device, anything
    /// other than a timeout, which is reported as [`Error::ReadTimeout`].
    #[error("log device I/O failed: {0}")]
    Io(#[source] std::io::Error),

    /// The handle was closed, either explicitly or from another thread
    /// while an operation was in flight.
    #[error("log device handle is closed")]
    Closed,

    /// A tag or message handed to the writer contained a NUL byte, which
    /// is the wire field separator.
    #[error("{what} contains an embedded NUL byte")]
    EmbeddedNul { what: &'static str },
}

impl Error {
    /// True if this error is a read timeout.
    ///
    /// Read loops re-arm their deadline and continue on timeouts, so this
    /// is the one classification callers routinely branch on.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::ReadTimeout)
    }
}
