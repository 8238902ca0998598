use devlog::{
    decode_entry, ChainedAbiExtension, Error, EuidAbiExtension, FieldValue, Priority,
    TimezoneAbiExtension, HEADER_SIZE,
};

const PID: i32 = 1234;
const TID: i32 = 5678;
const SEC: i32 = 1446319710;
const NSEC: i32 = 66931758;

fn header(payload_len: u16) -> Vec<u8> {
    let mut buf = Vec::with_capacity(HEADER_SIZE);
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&0u16.to_le_bytes()); // reserved padding
    buf.extend_from_slice(&PID.to_le_bytes());
    buf.extend_from_slice(&TID.to_le_bytes());
    buf.extend_from_slice(&SEC.to_le_bytes());
    buf.extend_from_slice(&NSEC.to_le_bytes());
    buf
}

fn payload(prio: u8, tag: &str, msg: &str) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.push(prio);
    buf.extend_from_slice(tag.as_bytes());
    buf.push(0);
    buf.extend_from_slice(msg.as_bytes());
    buf.push(0);
    buf
}

// One record as the device would deliver it: header, extension fields,
// payload, then any physical padding past the logical record.
fn record_with(ext: &[u8], prio: u8, tag: &str, msg: &str, padding: usize) -> Vec<u8> {
    let body = payload(prio, tag, msg);
    let mut buf = header(body.len() as u16);
    buf.extend_from_slice(ext);
    buf.extend_from_slice(&body);
    buf.extend(std::iter::repeat(0xAA).take(padding));
    buf
}

fn record(prio: u8, tag: &str, msg: &str) -> Vec<u8> {
    record_with(&[], prio, tag, msg, 0)
}

#[test]
fn test_decode_recovers_all_fields() {
    let buf = record(3, "Test", "42");
    let entry = decode_entry(&buf, &ChainedAbiExtension::new()).unwrap();

    assert_eq!(entry.priority, Priority::Debug);
    assert_eq!(entry.tag.as_str(), "Test");
    assert_eq!(entry.message, "42");
    assert_eq!(entry.pid, PID);
    assert_eq!(entry.tid, TID);
    assert_eq!(entry.when.seconds, SEC);
    assert_eq!(entry.when.nanoseconds, NSEC);
    assert_eq!(entry.euid, None);
    assert_eq!(entry.id, None);
    assert!(entry.ext.is_empty());
}

#[test]
fn test_short_header_is_malformed_not_defaulted() {
    let full = record(3, "Test", "42");
    for len in 0..HEADER_SIZE {
        let result = decode_entry(&full[..len], &ChainedAbiExtension::new());
        assert!(
            matches!(result, Err(Error::MalformedHeader)),
            "length {} should be a malformed header",
            len
        );
    }
}

#[test]
fn test_payload_of_three_or_fewer_bytes_is_invalid() {
    // A priority byte and two terminators is the shortest well-formed
    // payload; anything at or below three bytes must fail.
    for body in [&[][..], &[3][..], &[3, 0][..], &[3, 0, 0][..]] {
        let mut buf = header(body.len() as u16);
        buf.extend_from_slice(body);
        let result = decode_entry(&buf, &ChainedAbiExtension::new());
        assert!(
            matches!(result, Err(Error::InvalidEntry)),
            "{}-byte payload should be invalid",
            body.len()
        );
    }
}

#[test]
fn test_empty_tag_and_empty_message_decode_as_empty_strings() {
    // Both fields may be empty, they are never absent.
    let entry = decode_entry(&record(4, "", "x"), &ChainedAbiExtension::new()).unwrap();
    assert_eq!(entry.tag.as_str(), "");
    assert_eq!(entry.message, "x");

    let entry = decode_entry(&record(4, "T", ""), &ChainedAbiExtension::new()).unwrap();
    assert_eq!(entry.tag.as_str(), "T");
    assert_eq!(entry.message, "");
}

#[test]
fn test_unknown_priority_is_preserved_and_renders_as_u() {
    let buf = record(200, "Test", "42");
    let entry = decode_entry(&buf, &ChainedAbiExtension::new()).unwrap();

    assert_eq!(entry.priority, Priority::Other(200));
    assert_eq!(entry.priority.to_string(), "U");
}

#[test]
fn test_message_whitespace_is_trimmed() {
    let buf = record(4, "Test", "  42 \n");
    let entry = decode_entry(&buf, &ChainedAbiExtension::new()).unwrap();
    assert_eq!(entry.message, "42");
}

#[test]
fn test_physical_padding_past_declared_length_is_excluded() {
    // The device may deliver trailing padding beyond the logical record;
    // the declared length wins over the physical buffer size.
    let buf = record_with(&[], 3, "Test", "42", 32);
    let entry = decode_entry(&buf, &ChainedAbiExtension::new()).unwrap();
    assert_eq!(entry.message, "42");
}

#[test]
fn test_missing_tag_terminator_is_invalid() {
    let mut buf = header(8);
    buf.extend_from_slice(&[3, b'n', b'o', b'n', b'u', b'l', b'l', b's']);
    let result = decode_entry(&buf, &ChainedAbiExtension::new());
    assert!(matches!(result, Err(Error::InvalidEntry)));
}

#[test]
fn test_declared_length_past_physical_buffer_is_invalid() {
    let body = payload(3, "Test", "42");
    let mut buf = header(body.len() as u16 + 10);
    buf.extend_from_slice(&body);
    let result = decode_entry(&buf, &ChainedAbiExtension::new());
    assert!(matches!(result, Err(Error::InvalidEntry)));
}

#[test]
fn test_euid_field_is_decoded_and_lifted() {
    let buf = record_with(&10010u32.to_le_bytes(), 4, "Test", "42", 0);
    let chain = ChainedAbiExtension::new().with(EuidAbiExtension);
    let entry = decode_entry(&buf, &chain).unwrap();

    assert_eq!(entry.euid, Some(10010));
    assert_eq!(entry.ext["euid"], FieldValue::U32(10010));
    assert_eq!(entry.tag.as_str(), "Test");
    assert_eq!(entry.message, "42");
}

#[test]
fn test_stacked_extensions_consume_in_registration_order() {
    // A vendor timezone field followed by the euid field, cumulative.
    let mut ext = Vec::new();
    ext.extend_from_slice(&(-3600i32).to_le_bytes());
    ext.extend_from_slice(&10010u32.to_le_bytes());

    let buf = record_with(&ext, 6, "Test", "42", 0);
    let chain = ChainedAbiExtension::new()
        .with(TimezoneAbiExtension)
        .with(EuidAbiExtension);
    let entry = decode_entry(&buf, &chain).unwrap();

    assert_eq!(entry.ext["tz"], FieldValue::I32(-3600));
    assert_eq!(entry.ext["euid"], FieldValue::U32(10010));
    assert_eq!(entry.priority, Priority::Error);
    assert_eq!(entry.message, "42");
}

#[test]
fn test_failing_extension_yields_no_partial_entry() {
    // The record carries no extension bytes, so the euid read runs into
    // the payload and the remainder cannot parse as a record either way;
    // the decode must surface the extension failure, not a partial entry.
    let mut buf = header(3);
    buf.extend_from_slice(&[3, 0]);
    let chain = ChainedAbiExtension::new().with(EuidAbiExtension);
    let result = decode_entry(&buf, &chain);
    assert!(matches!(result, Err(Error::ExtensionDecodeFailed(_))));
}
