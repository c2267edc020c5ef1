// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;

#[test]
fn test_tag_layout() {
    let mut w = WireWriter::new();
    w.write_tag(1, WireType::Varint);
    w.write_tag(2, WireType::LengthDelimited);
    assert_eq!(w.as_bytes(), &[0x08, 0x12]);

    let mut r = WireReader::new(w.as_bytes());
    assert_eq!(r.read_tag().expect("tag"), (1, WireType::Varint));
    assert_eq!(r.read_tag().expect("tag"), (2, WireType::LengthDelimited));
    assert!(r.is_empty());
}

#[test]
fn test_negative_int32_is_ten_bytes() {
    let mut w = WireWriter::new();
    w.write_int32(-1);
    assert_eq!(w.len(), 10);
    let mut r = WireReader::new(w.as_bytes());
    assert_eq!(r.read_int32().expect("int32"), -1);
}

#[test]
fn test_nested_scope_is_length_prefixed() {
    let mut w = WireWriter::new();
    w.write_nested::<WireError>(|inner| {
        inner.write_tag(1, WireType::Varint);
        inner.write_varint(150);
        Ok(())
    })
    .expect("nested");
    assert_eq!(w.as_bytes(), &[0x03, 0x08, 0x96, 0x01]);
}

#[test]
fn test_field_zero_rejected() {
    let mut r = WireReader::new(&[0x00]);
    assert_eq!(r.read_tag(), Err(WireError::InvalidFieldNumber(0)));
}

#[test]
fn test_invalid_wire_type_rejected() {
    // field 1, wire type 7
    let mut r = WireReader::new(&[0x0F]);
    assert_eq!(r.read_tag(), Err(WireError::InvalidWireType(7)));
}

#[test]
fn test_truncated_bytes() {
    let mut r = WireReader::new(&[0x05, b'a', b'b']);
    assert_eq!(r.read_bytes(), Err(WireError::Truncated));
}

#[test]
fn test_skip_group() {
    let mut w = WireWriter::new();
    w.write_tag(4, WireType::StartGroup);
    w.write_tag(1, WireType::Varint);
    w.write_varint(7);
    w.write_tag(4, WireType::EndGroup);
    w.write_tag(5, WireType::Fixed32);
    w.write_fixed32(9);

    let mut r = WireReader::new(w.as_bytes());
    let (field, wire_type) = r.read_tag().expect("tag");
    r.skip(field, wire_type).expect("skip group");
    assert_eq!(r.read_tag().expect("tag"), (5, WireType::Fixed32));
    assert_eq!(r.read_fixed32().expect("fixed32"), 9);
    assert_eq!(r.depth(), 0);
}

fn nested_groups(levels: usize) -> Vec<u8> {
    // field 5 start-group tags, then the matching end tags
    let mut bytes = vec![0x2B; levels];
    bytes.extend(std::iter::repeat(0x2C).take(levels));
    bytes
}

#[test]
fn test_skip_groups_up_to_depth_limit() {
    let limit = MAX_NESTING_DEPTH as usize;
    let bytes = nested_groups(limit);
    let mut r = WireReader::new(&bytes);
    let (field, wire_type) = r.read_tag().expect("tag");
    r.skip(field, wire_type).expect("skip at limit");
    assert!(r.is_empty());
    assert_eq!(r.depth(), 0);

    let bytes = nested_groups(limit + 1);
    let mut r = WireReader::new(&bytes);
    let (field, wire_type) = r.read_tag().expect("tag");
    assert_eq!(
        r.skip(field, wire_type),
        Err(WireError::RecursionLimit(MAX_NESTING_DEPTH))
    );
}

#[test]
fn test_unterminated_group_flood_is_an_error() {
    let bytes = vec![0x2B; 500_000];
    let mut r = WireReader::new(&bytes);
    let (field, wire_type) = r.read_tag().expect("tag");
    assert_eq!(
        r.skip(field, wire_type),
        Err(WireError::RecursionLimit(MAX_NESTING_DEPTH))
    );
}

#[test]
fn test_nested_readers_track_depth() {
    let mut payload = Vec::new();
    for _ in 0..=MAX_NESTING_DEPTH {
        let mut w = WireWriter::new();
        w.write_bytes(&payload);
        payload = w.into_bytes();
    }

    let mut r = WireReader::new(&payload);
    for level in 1..=MAX_NESTING_DEPTH {
        r = r.read_nested().expect("nested");
        assert_eq!(r.depth(), level);
    }
    assert_eq!(
        r.read_nested().map(|_| ()),
        Err(WireError::RecursionLimit(MAX_NESTING_DEPTH))
    );
}

#[test]
fn test_invalid_utf8() {
    let mut w = WireWriter::new();
    w.write_bytes(&[0xFF, 0xFE]);
    let mut r = WireReader::new(w.as_bytes());
    assert_eq!(r.read_string(), Err(WireError::InvalidUtf8));
}
