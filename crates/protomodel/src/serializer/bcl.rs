// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Legacy wrapper messages (`bcl.proto`) and the well-known time types.
//!
//! ```text
//! bcl.TimeSpan / bcl.DateTime { sint64 value = 1; TimeSpanScale scale = 2; }
//! bcl.Decimal                 { uint64 lo = 1; uint32 hi = 2; uint32 signScale = 3; }
//! bcl.Guid                    { fixed64 lo = 1; fixed64 hi = 2; }
//! google.protobuf.Timestamp / Duration { int64 seconds = 1; int32 nanos = 2; }
//! ```
//!
//! Every function here works on the message body; callers add the
//! length prefix.

use crate::error::{Error, Result};
use crate::wire::{WireReader, WireType, WireWriter};

const TICKS_PER_SECOND: i128 = 10_000_000;
const NANOS_PER_TICK: i128 = 100;

/// `TimeSpanScale` values with their size in ticks, coarsest first.
const SCALES: &[(u64, i128)] = &[
    (0, 864_000_000_000), // days
    (1, 36_000_000_000),  // hours
    (2, 600_000_000),     // minutes
    (3, 10_000_000),      // seconds
    (4, 10_000),          // milliseconds
    (5, 1),               // ticks
];

const SCALE_MINMAX: u64 = 15;

fn invalid(what: &str, detail: impl std::fmt::Display) -> Error {
    Error::ValueMismatch {
        expected: what.to_string(),
        found: detail.to_string(),
    }
}

// ============================================================================
// Time
// ============================================================================

/// Write seconds/nanos (relative to the Unix epoch for date-times) as a
/// scaled tick count.
pub(crate) fn write_scaled_time(seconds: i64, nanos: i32, out: &mut WireWriter) -> Result<()> {
    let ticks = i128::from(seconds) * TICKS_PER_SECOND + i128::from(nanos) / NANOS_PER_TICK;
    if ticks == 0 {
        return Ok(());
    }
    let (scale, size) = SCALES
        .iter()
        .copied()
        .find(|(_, size)| ticks % size == 0)
        .unwrap_or((5, 1));
    let value = i64::try_from(ticks / size).map_err(|_| invalid("time in range", ticks))?;

    out.write_tag(1, WireType::Varint);
    out.write_sint64(value);
    if scale != 0 {
        out.write_tag(2, WireType::Varint);
        out.write_varint(scale);
    }
    Ok(())
}

pub(crate) fn read_scaled_time(input: &mut WireReader<'_>) -> Result<(i64, i32)> {
    let mut value = 0i64;
    let mut scale = 0u64;
    while !input.is_empty() {
        match input.read_tag()? {
            (1, WireType::Varint) => value = input.read_sint64()?,
            (2, WireType::Varint) => scale = input.read_varint()?,
            (field, wire_type) => input.skip(field, wire_type)?,
        }
    }

    if scale == SCALE_MINMAX {
        return Ok(match value {
            1 => (i64::MAX, 0),
            -1 => (i64::MIN, 0),
            other => return Err(invalid("MinMax of -1 or 1", other)),
        });
    }
    let size = SCALES
        .iter()
        .find(|(id, _)| *id == scale)
        .map(|(_, size)| *size)
        .ok_or_else(|| invalid("known time scale", scale))?;

    let ticks = i128::from(value) * size;
    let seconds = i64::try_from(ticks.div_euclid(TICKS_PER_SECOND))
        .map_err(|_| invalid("time in range", ticks))?;
    let nanos = (ticks.rem_euclid(TICKS_PER_SECOND) * NANOS_PER_TICK) as i32;
    Ok((seconds, nanos))
}

pub(crate) fn write_well_known_time(seconds: i64, nanos: i32, out: &mut WireWriter) {
    if seconds != 0 {
        out.write_tag(1, WireType::Varint);
        out.write_int64(seconds);
    }
    if nanos != 0 {
        out.write_tag(2, WireType::Varint);
        out.write_int32(nanos);
    }
}

pub(crate) fn read_well_known_time(input: &mut WireReader<'_>) -> Result<(i64, i32)> {
    let (mut seconds, mut nanos) = (0i64, 0i32);
    while !input.is_empty() {
        match input.read_tag()? {
            (1, WireType::Varint) => seconds = input.read_int64()?,
            (2, WireType::Varint) => nanos = input.read_int32()?,
            (field, wire_type) => input.skip(field, wire_type)?,
        }
    }
    Ok((seconds, nanos))
}

// ============================================================================
// Decimal
// ============================================================================

const MAX_DECIMAL_SCALE: u32 = 28;

/// Parse decimal text into (96-bit mantissa, scale, negative).
fn parse_decimal(text: &str) -> Result<(u128, u32, bool)> {
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return Err(invalid("decimal text", text));
    }

    let mut mantissa: u128 = 0;
    for ch in int_part.chars().chain(frac_part.chars()) {
        let digit = ch.to_digit(10).ok_or_else(|| invalid("decimal text", text))?;
        mantissa = mantissa
            .checked_mul(10)
            .and_then(|m| m.checked_add(u128::from(digit)))
            .ok_or_else(|| invalid("96-bit decimal", text))?;
    }
    let scale = frac_part.len() as u32;
    if mantissa >> 96 != 0 || scale > MAX_DECIMAL_SCALE {
        return Err(invalid("96-bit decimal", text));
    }
    Ok((mantissa, scale, negative))
}

fn format_decimal(mantissa: u128, scale: u32, negative: bool) -> String {
    let mut digits = mantissa.to_string();
    let scale = scale as usize;
    if scale > 0 {
        if digits.len() <= scale {
            digits = format!("{}{}", "0".repeat(scale + 1 - digits.len()), digits);
        }
        digits.insert(digits.len() - scale, '.');
    }
    if negative && mantissa != 0 {
        digits.insert(0, '-');
    }
    digits
}

pub(crate) fn write_decimal(text: &str, out: &mut WireWriter) -> Result<()> {
    let (mantissa, scale, negative) = parse_decimal(text)?;
    let lo = mantissa as u64;
    let hi = (mantissa >> 64) as u32;
    let sign_scale = (scale << 1) | u32::from(negative);
    if lo != 0 {
        out.write_tag(1, WireType::Varint);
        out.write_varint(lo);
    }
    if hi != 0 {
        out.write_tag(2, WireType::Varint);
        out.write_varint(u64::from(hi));
    }
    if sign_scale != 0 {
        out.write_tag(3, WireType::Varint);
        out.write_varint(u64::from(sign_scale));
    }
    Ok(())
}

pub(crate) fn read_decimal(input: &mut WireReader<'_>) -> Result<String> {
    let (mut lo, mut hi, mut sign_scale) = (0u64, 0u32, 0u64);
    while !input.is_empty() {
        match input.read_tag()? {
            (1, WireType::Varint) => lo = input.read_varint()?,
            (2, WireType::Varint) => hi = input.read_varint()? as u32,
            (3, WireType::Varint) => sign_scale = input.read_varint()?,
            (field, wire_type) => input.skip(field, wire_type)?,
        }
    }
    let scale = sign_scale >> 1;
    if scale > u64::from(MAX_DECIMAL_SCALE) {
        return Err(invalid("decimal scale", scale));
    }
    let mantissa = (u128::from(hi) << 64) | u128::from(lo);
    Ok(format_decimal(mantissa, scale as u32, sign_scale & 1 == 1))
}

// ============================================================================
// Guid
// ============================================================================

/// Parse `xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx` into the mixed-endian byte
/// order used by the legacy encoding (first three groups little-endian).
pub(crate) fn guid_to_bytes(text: &str) -> Result<[u8; 16]> {
    let hex: String = text
        .trim()
        .trim_matches(|c| c == '{' || c == '}')
        .chars()
        .filter(|c| *c != '-')
        .collect();
    if hex.len() != 32 || !hex.is_ascii() {
        return Err(invalid("guid text", text));
    }
    let mut raw = [0u8; 16];
    for (i, byte) in raw.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .map_err(|_| invalid("guid text", text))?;
    }
    raw[0..4].reverse();
    raw[4..6].reverse();
    raw[6..8].reverse();
    Ok(raw)
}

pub(crate) fn guid_from_bytes(bytes: &[u8]) -> Result<String> {
    let mut raw: [u8; 16] = bytes
        .try_into()
        .map_err(|_| invalid("16 guid bytes", bytes.len()))?;
    raw[0..4].reverse();
    raw[4..6].reverse();
    raw[6..8].reverse();
    let hex: String = raw.iter().map(|b| format!("{:02x}", b)).collect();
    Ok(format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    ))
}

pub(crate) fn write_guid(text: &str, out: &mut WireWriter) -> Result<()> {
    let raw = guid_to_bytes(text)?;
    let mut lo = [0u8; 8];
    let mut hi = [0u8; 8];
    lo.copy_from_slice(&raw[0..8]);
    hi.copy_from_slice(&raw[8..16]);
    let (lo, hi) = (u64::from_le_bytes(lo), u64::from_le_bytes(hi));
    if lo != 0 {
        out.write_tag(1, WireType::Fixed64);
        out.write_fixed64(lo);
    }
    if hi != 0 {
        out.write_tag(2, WireType::Fixed64);
        out.write_fixed64(hi);
    }
    Ok(())
}

pub(crate) fn read_guid(input: &mut WireReader<'_>) -> Result<String> {
    let (mut lo, mut hi) = (0u64, 0u64);
    while !input.is_empty() {
        match input.read_tag()? {
            (1, WireType::Fixed64) => lo = input.read_fixed64()?,
            (2, WireType::Fixed64) => hi = input.read_fixed64()?,
            (field, wire_type) => input.skip(field, wire_type)?,
        }
    }
    let mut raw = [0u8; 16];
    raw[0..8].copy_from_slice(&lo.to_le_bytes());
    raw[8..16].copy_from_slice(&hi.to_le_bytes());
    guid_from_bytes(&raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(write: impl FnOnce(&mut WireWriter) -> Result<()>) -> Vec<u8> {
        let mut w = WireWriter::new();
        write(&mut w).expect("write");
        w.into_bytes()
    }

    #[test]
    fn test_scaled_time_picks_coarsest_scale() {
        // 2 hours
        let bytes = body(|w| write_scaled_time(7200, 0, w));
        // value=2 (zigzag 4), scale=1 (hours)
        assert_eq!(bytes, vec![0x08, 0x04, 0x10, 0x01]);
        let (seconds, nanos) = read_scaled_time(&mut WireReader::new(&bytes)).expect("read");
        assert_eq!((seconds, nanos), (7200, 0));
    }

    #[test]
    fn test_scaled_time_sub_second_and_negative() {
        let bytes = body(|w| write_scaled_time(-2, 500_000_000, w));
        let (seconds, nanos) = read_scaled_time(&mut WireReader::new(&bytes)).expect("read");
        assert_eq!((seconds, nanos), (-2, 500_000_000));
        assert!(body(|w| write_scaled_time(0, 0, w)).is_empty());
    }

    #[test]
    fn test_decimal_text() {
        for text in ["0", "1.5", "-123.4500", "0.001", "79228162514264337593543950335"] {
            let bytes = body(|w| write_decimal(text, w));
            let back = read_decimal(&mut WireReader::new(&bytes)).expect("read");
            assert_eq!(back, text.trim_start_matches('+'));
        }
        assert!(write_decimal("79228162514264337593543950336", &mut WireWriter::new()).is_err());
        assert!(write_decimal("1.2.3", &mut WireWriter::new()).is_err());
    }

    #[test]
    fn test_decimal_scale_is_bounded_on_read() {
        let max = body(|w| {
            w.write_tag(1, WireType::Varint);
            w.write_varint(5);
            w.write_tag(3, WireType::Varint);
            w.write_varint(u64::from(MAX_DECIMAL_SCALE) << 1);
            Ok(())
        });
        let text = read_decimal(&mut WireReader::new(&max)).expect("read");
        assert_eq!(text.len(), MAX_DECIMAL_SCALE as usize + 2);

        for sign_scale in [u64::from(MAX_DECIMAL_SCALE + 1) << 1, 2_000_000, 0xFFFF_FFFE] {
            let bytes = body(|w| {
                w.write_tag(3, WireType::Varint);
                w.write_varint(sign_scale);
                Ok(())
            });
            assert!(matches!(
                read_decimal(&mut WireReader::new(&bytes)),
                Err(Error::ValueMismatch { .. })
            ));
        }
    }

    #[test]
    fn test_guid_byte_order() {
        let text = "00112233-4455-6677-8899-aabbccddeeff";
        let raw = guid_to_bytes(text).expect("guid");
        assert_eq!(&raw[0..8], &[0x33, 0x22, 0x11, 0x00, 0x55, 0x44, 0x77, 0x66]);
        assert_eq!(guid_from_bytes(&raw).expect("text"), text);

        let bytes = body(|w| write_guid(text, w));
        assert_eq!(read_guid(&mut WireReader::new(&bytes)).expect("read"), text);
    }
}
