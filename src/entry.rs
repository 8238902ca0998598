use std::collections::HashMap;
use std::fmt;

/// Core data model for log entries.
///
/// This module defines the decoded representation of a single log record
/// together with the priority, tag and stream-id enumerations used to
/// address and classify entries.

/// The moment an entry was accepted by the logging facility.
///
/// Timestamps are produced exclusively by decoding records read back from a
/// device. Writers never construct one, the facility stamps every entry on
/// ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    /// Seconds since the epoch.
    pub seconds: i32,

    /// Nanoseconds since the epoch.
    pub nanoseconds: i32,
}

/// A short text label describing the origin of an entry.
///
/// Tags are opaque to the wire format except for one rule: they must not
/// contain a NUL byte, which is the field separator on the wire. That rule
/// is enforced by the writer at encode time, not by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag(pub String);

impl Tag {
    /// Returns the tag as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Tag {
    fn from(s: &str) -> Self {
        Tag(s.to_owned())
    }
}

impl From<String> for Tag {
    fn from(s: String) -> Self {
        Tag(s)
    }
}

impl AsRef<str> for Tag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The log priority of a single entry.
///
/// Priorities form a numeric severity scale. The raw byte from the wire is
/// preserved as-is, values outside the known range decode successfully and
/// render as "U".
///
/// # Examples
///
/// ```
/// use devlog::Priority;
///
/// assert_eq!(Priority::Debug.to_string(), "D");
/// assert_eq!(Priority::from(200).to_string(), "U");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Unknown,
    Default,
    Verbose,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Silent,
    /// A numeric value outside the known range, preserved for inspection.
    Other(u8),
}

impl Priority {
    /// Returns the numeric wire value of this priority.
    ///
    /// The numbers form the severity scale, compare these when filtering
    /// by severity.
    pub fn as_u8(self) -> u8 {
        match self {
            Priority::Unknown => 0,
            Priority::Default => 1,
            Priority::Verbose => 2,
            Priority::Debug => 3,
            Priority::Info => 4,
            Priority::Warn => 5,
            Priority::Error => 6,
            Priority::Fatal => 7,
            Priority::Silent => 8,
            Priority::Other(v) => v,
        }
    }
}

impl From<u8> for Priority {
    fn from(v: u8) -> Self {
        match v {
            0 => Priority::Unknown,
            1 => Priority::Default,
            2 => Priority::Verbose,
            3 => Priority::Debug,
            4 => Priority::Info,
            5 => Priority::Warn,
            6 => Priority::Error,
            7 => Priority::Fatal,
            8 => Priority::Silent,
            other => Priority::Other(other),
        }
    }
}

impl fmt::Display for Priority {
    /// Renders the canonical one-letter code of a priority.
    ///
    /// Unknown and Default are distinct codes despite their numeric
    /// adjacency to Verbose and Debug: Unknown is "U", Default is "D".
    /// Unrecognized values render as "U".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Priority::Unknown => "U",
            Priority::Default => "D",
            Priority::Verbose => "V",
            Priority::Debug => "D",
            Priority::Info => "I",
            Priority::Warn => "W",
            Priority::Error => "E",
            Priority::Fatal => "F",
            Priority::Silent => "S",
            Priority::Other(_) => "U",
        };
        f.write_str(code)
    }
}

/// Identifies one of the facility's independent log streams.
///
/// Each stream is addressed through a device node named after the stream,
/// see [`LogRoot::path`](crate::LogRoot::path).
///
/// # Examples
///
/// ```
/// use devlog::LogId;
///
/// assert_eq!(LogId::Radio.name(), "radio");
/// assert_eq!(LogId::from(42).name(), "main");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogId {
    Main,
    Radio,
    Events,
    System,
    Crash,
}

impl LogId {
    /// Returns the canonical lowercase name of the stream.
    pub fn name(self) -> &'static str {
        match self {
            LogId::Main => "main",
            LogId::Radio => "radio",
            LogId::Events => "events",
            LogId::System => "system",
            LogId::Crash => "crash",
        }
    }
}

impl From<i32> for LogId {
    /// Maps a raw stream number to a LogId.
    ///
    /// Unrecognized values fall back to Main rather than failing.
    fn from(v: i32) -> Self {
        match v {
            1 => LogId::Radio,
            2 => LogId::Events,
            3 => LogId::System,
            4 => LogId::Crash,
            _ => LogId::Main,
        }
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A value decoded from an ABI extension field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue {
    /// A 32-bit unsigned integer field.
    U32(u32),

    /// A 32-bit signed integer field.
    I32(i32),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::U32(v) => write!(f, "{}", v),
            FieldValue::I32(v) => write!(f, "{}", v),
        }
    }
}

/// One decoded log record.
///
/// An Entry is produced exactly once per successful decode and is owned by
/// the caller that received it. A successfully decoded Entry always has a
/// tag and a message, possibly empty, and never defaults any field from a
/// malformed record.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Generating process's ID.
    pub pid: i32,

    /// Generating thread's ID.
    pub tid: i32,

    /// When the entry was accepted by the facility.
    pub when: Timestamp,

    /// Priority of the message.
    pub priority: Priority,

    /// Tag describing the origin of the message.
    pub tag: Tag,

    /// The message text, trimmed of surrounding whitespace.
    pub message: String,

    /// Effective user ID of the logging process, present only when an
    /// euid-providing extension ran.
    pub euid: Option<u32>,

    /// The stream this entry was read from, when known.
    pub id: Option<LogId>,

    /// Extension-provided fields, merged across the configured extension
    /// chain. Empty when no chain was configured.
    pub ext: HashMap<String, FieldValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_wire_values() {
        assert_eq!(Priority::Unknown.as_u8(), 0);
        assert_eq!(Priority::Default.as_u8(), 1);
        assert_eq!(Priority::Verbose.as_u8(), 2);
        assert_eq!(Priority::Debug.as_u8(), 3);
        assert_eq!(Priority::Info.as_u8(), 4);
        assert_eq!(Priority::Warn.as_u8(), 5);
        assert_eq!(Priority::Error.as_u8(), 6);
        assert_eq!(Priority::Fatal.as_u8(), 7);
        assert_eq!(Priority::Silent.as_u8(), 8);
    }

    #[test]
    fn test_priority_round_trips_through_u8() {
        for v in 0u8..=8 {
            assert_eq!(Priority::from(v).as_u8(), v);
        }
        assert_eq!(Priority::from(77), Priority::Other(77));
        assert_eq!(Priority::Other(77).as_u8(), 77);
    }

    #[test]
    fn test_priority_short_codes() {
        assert_eq!(Priority::Unknown.to_string(), "U");
        assert_eq!(Priority::Default.to_string(), "D");
        assert_eq!(Priority::Verbose.to_string(), "V");
        assert_eq!(Priority::Debug.to_string(), "D");
        assert_eq!(Priority::Info.to_string(), "I");
        assert_eq!(Priority::Warn.to_string(), "W");
        assert_eq!(Priority::Error.to_string(), "E");
        assert_eq!(Priority::Fatal.to_string(), "F");
        assert_eq!(Priority::Silent.to_string(), "S");
        assert_eq!(Priority::Other(42).to_string(), "U");
    }

    #[test]
    fn test_log_id_names() {
        assert_eq!(LogId::Main.name(), "main");
        assert_eq!(LogId::Radio.name(), "radio");
        assert_eq!(LogId::Events.name(), "events");
        assert_eq!(LogId::System.name(), "system");
        assert_eq!(LogId::Crash.name(), "crash");
    }

    #[test]
    fn test_log_id_from_unknown_number_falls_back_to_main() {
        assert_eq!(LogId::from(0), LogId::Main);
        assert_eq!(LogId::from(4), LogId::Crash);
        assert_eq!(LogId::from(42), LogId::Main);
        assert_eq!(LogId::from(-1), LogId::Main);
    }

    #[test]
    fn test_tag_conversions() {
        let tag = Tag::from("Test");
        assert_eq!(tag.as_str(), "Test");
        assert_eq!(tag.to_string(), "Test");
        assert_eq!(Tag::from(String::from("Test")), tag);
    }
}
