// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! ULEB128 varints and zig-zag mapping, as used by protobuf.
//!
//! # Encoding Rules
//!
//! - Each byte uses 7 bits for data, bit 7 indicates continuation
//! - Values 0-127 encode in 1 byte
//! - Maximum encoded length for u64 is 10 bytes
//!
//! # Examples
//!
//! ```
//! use protomodel::wire::varint::{decode_varint, encode_varint};
//!
//! let mut buf = [0u8; 10];
//! let len = encode_varint(300, &mut buf);
//! assert_eq!(&buf[..len], &[0xAC, 0x02]);
//!
//! let (value, consumed) = decode_varint(&buf[..len]).unwrap();
//! assert_eq!((value, consumed), (300, 2));
//! ```

use super::WireError;

/// Maximum bytes needed to encode a u64.
pub const MAX_VARINT_LEN: usize = 10;

const CONTINUATION_BIT: u8 = 0x80;
const DATA_MASK: u8 = 0x7F;

/// Encode `value` into `buf`, returning the number of bytes written (1-10).
///
/// # Panics
///
/// Panics if `buf` is shorter than [`varint_len`] of the value.
#[inline]
pub fn encode_varint(mut value: u64, buf: &mut [u8]) -> usize {
    let mut i = 0;
    loop {
        let byte = (value & u64::from(DATA_MASK)) as u8;
        value >>= 7;
        if value == 0 {
            buf[i] = byte;
            return i + 1;
        }
        buf[i] = byte | CONTINUATION_BIT;
        i += 1;
    }
}

/// Append the encoding of `value` to `out`.
#[inline]
pub fn push_varint(value: u64, out: &mut Vec<u8>) {
    let mut buf = [0u8; MAX_VARINT_LEN];
    let len = encode_varint(value, &mut buf);
    out.extend_from_slice(&buf[..len]);
}

/// Number of bytes needed to encode `value`.
#[inline]
#[must_use]
pub const fn varint_len(value: u64) -> usize {
    if value == 0 {
        return 1;
    }
    let bits = 64 - value.leading_zeros() as usize;
    bits.div_ceil(7)
}

/// Decode a varint from the front of `buf`.
///
/// Returns `(value, bytes_consumed)`.
///
/// # Errors
///
/// - `Truncated` if the buffer ends before the varint terminates
/// - `VarintOverflow` if the varint exceeds 10 bytes or 64 bits
#[inline]
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize), WireError> {
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    for (i, &byte) in buf.iter().enumerate() {
        if i >= MAX_VARINT_LEN {
            return Err(WireError::VarintOverflow);
        }

        let data = u64::from(byte & DATA_MASK);

        // At shift 63 only bit 0 still fits.
        if shift == 63 && data > 1 {
            return Err(WireError::VarintOverflow);
        }

        result |= data << shift;

        if byte & CONTINUATION_BIT == 0 {
            return Ok((result, i + 1));
        }
        shift += 7;
    }

    Err(WireError::Truncated)
}

/// Zig-zag map a signed 32-bit value (`sint32`).
#[inline]
pub const fn zigzag32(value: i32) -> u32 {
    ((value << 1) ^ (value >> 31)) as u32
}

/// Inverse of [`zigzag32`].
#[inline]
pub const fn unzigzag32(value: u32) -> i32 {
    ((value >> 1) as i32) ^ -((value & 1) as i32)
}

/// Zig-zag map a signed 64-bit value (`sint64`).
#[inline]
pub const fn zigzag64(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag64`].
#[inline]
pub const fn unzigzag64(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}
