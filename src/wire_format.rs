use crate::abi_extension::ChainedAbiExtension;
use crate::entry::{Entry, FieldValue, Priority, Tag, Timestamp};
use crate::error::{Error, Result};

/// Wire codec for log records.
///
/// One record on the wire is a fixed little-endian header, optional
/// extension fields negotiated out of band, and a variable-length payload
/// of `priority, tag, NUL, message, NUL`. Decoding is a pure transform over
/// one read's worth of bytes; encoding produces the three segments a writer
/// hands to a single vectored write.

/// Maximum size of a single record delivered by the device.
pub const MAX_ENTRY_SIZE: usize = 5 * 1024;

/// Size of the fixed wire header in bytes.
///
/// Layout, all little-endian: `payload_len: u16`, two reserved padding
/// bytes, `pid: i32`, `tid: i32`, `seconds: i32`, `nanoseconds: i32`.
pub const HEADER_SIZE: usize = 20;

/// The decoded fixed header of one record.
///
/// `payload_len` is the length the facility recorded for the base payload,
/// which may be shorter than the bytes physically delivered. The reserved
/// padding field is discarded on parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireHeader {
    pub payload_len: u16,
    pub pid: i32,
    pub tid: i32,
    pub seconds: i32,
    pub nanoseconds: i32,
}

impl WireHeader {
    /// Parses a header from the front of `buf`.
    ///
    /// Fails with [`Error::MalformedHeader`] if fewer than
    /// [`HEADER_SIZE`] bytes are present. Truncation is always an error,
    /// never a defaulted header.
    pub fn parse(buf: &[u8]) -> Result<WireHeader> {
        if buf.len() < HEADER_SIZE {
            return Err(Error::MalformedHeader);
        }

        Ok(WireHeader {
            payload_len: u16::from_le_bytes([buf[0], buf[1]]),
            // buf[2..4] is reserved padding
            pid: i32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]),
            tid: i32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]),
            seconds: i32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]),
            nanoseconds: i32::from_le_bytes([buf[16], buf[17], buf[18], buf[19]]),
        })
    }
}

/// A bounded forward-only cursor over the bytes of one record.
///
/// The extension chain consumes its fields through this cursor, advancing
/// it past exactly the bytes each extension needs. Whatever remains after
/// the chain ran is the base payload.
pub struct WireCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WireCursor<'a> {
    /// Creates a cursor over `data`, positioned at the start.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Number of bytes left to consume.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Reads a little-endian u32, advancing the cursor.
    ///
    /// Fails with [`Error::InvalidEntry`] if fewer than four bytes remain.
    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads a little-endian i32, advancing the cursor.
    pub fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.take(4)?;
        Ok(i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Consumes and returns the next `len` bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(Error::InvalidEntry);
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Consumes and returns everything left in the cursor.
    pub fn take_rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }
}

/// Decodes one raw record into an [`Entry`].
///
/// `buf` holds the bytes of exactly one read call. The configured extension
/// chain runs between the header and the base payload; an empty chain
/// consumes nothing, which is the classic wire format.
///
/// The message is bounded by the header's declared payload length rather
/// than the physical buffer, the device may deliver trailing padding past
/// the logical record. Surrounding whitespace is trimmed from the message.
///
/// Decoding never yields a partial Entry: any structural failure, in the
/// header, an extension field or the payload, fails the whole record.
pub fn decode_entry(buf: &[u8], chain: &ChainedAbiExtension) -> Result<Entry> {
    let header = WireHeader::parse(buf)?;

    let mut cursor = WireCursor::new(&buf[HEADER_SIZE..]);
    let ext = chain.read(&mut cursor)?;

    let payload = cursor.take_rest();

    // At minimum a priority byte, an empty tag terminator and an empty
    // message terminator.
    if payload.len() <= 3 {
        return Err(Error::InvalidEntry);
    }

    let priority = Priority::from(payload[0]);

    let tag_nul = match payload[1..].iter().position(|&b| b == 0) {
        Some(rel) => rel + 1,
        None => return Err(Error::InvalidEntry),
    };
    let tag = Tag(String::from_utf8_lossy(&payload[1..tag_nul]).into_owned());

    // The logical record ends at payload_len - 1, excluding the trailing
    // terminator the facility accounts for in its declared length.
    let msg_start = tag_nul + 1;
    let msg_end = header.payload_len as usize;
    if msg_end < msg_start + 1 || msg_end > payload.len() {
        return Err(Error::InvalidEntry);
    }
    let message = String::from_utf8_lossy(&payload[msg_start..msg_end - 1])
        .trim()
        .to_owned();

    let euid = match ext.get("euid") {
        Some(FieldValue::U32(v)) => Some(*v),
        _ => None,
    };

    Ok(Entry {
        pid: header.pid,
        tid: header.tid,
        when: Timestamp {
            seconds: header.seconds,
            nanoseconds: header.nanoseconds,
        },
        priority,
        tag,
        message,
        euid,
        id: None,
        ext,
    })
}

/// The three byte segments of one encoded record.
///
/// The device's vectored write concatenates these atomically into a single
/// record. No header is produced here, the facility computes and stores it
/// when it accepts the write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireSegments {
    priority: [u8; 1],
    tag: Vec<u8>,
    message: Vec<u8>,
}

impl WireSegments {
    /// Borrows the segments in wire order.
    pub fn as_slices(&self) -> [&[u8]; 3] {
        [&self.priority, &self.tag, &self.message]
    }

    /// Total number of bytes across all segments.
    pub fn len(&self) -> usize {
        1 + self.tag.len() + self.message.len()
    }

    /// True if the segments hold no bytes. Never the case for segments
    /// produced by [`encode_segments`].
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Encodes a record into the segments for one vectored write.
///
/// Produces exactly three segments: the priority byte, the tag with an
/// appended NUL terminator, and the message with an appended NUL
/// terminator. A NUL byte inside the tag or message would corrupt the
/// field framing on the wire and is rejected with [`Error::EmbeddedNul`].
pub fn encode_segments(priority: Priority, tag: &Tag, message: &str) -> Result<WireSegments> {
    if tag.as_str().as_bytes().contains(&0) {
        return Err(Error::EmbeddedNul { what: "tag" });
    }
    if message.as_bytes().contains(&0) {
        return Err(Error::EmbeddedNul { what: "message" });
    }

    let mut tag_bytes = Vec::with_capacity(tag.as_str().len() + 1);
    tag_bytes.extend_from_slice(tag.as_str().as_bytes());
    tag_bytes.push(0);

    let mut message_bytes = Vec::with_capacity(message.len() + 1);
    message_bytes.extend_from_slice(message.as_bytes());
    message_bytes.push(0);

    Ok(WireSegments {
        priority: [priority.as_u8()],
        tag: tag_bytes,
        message: message_bytes,
    })
}
