// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte-level protobuf read/write primitives.
//!
//! Serializers only talk to [`WireWriter`] and [`WireReader`]; they never
//! touch the byte layout directly.

pub mod varint;

use varint::{decode_varint, push_varint, unzigzag32, unzigzag64, zigzag32, zigzag64};

/// Highest legal protobuf field number.
pub const MAX_FIELD_NUMBER: u32 = 536_870_911;

/// Deepest nesting of messages and groups a reader accepts.
pub const MAX_NESTING_DEPTH: u32 = 100;

/// Protobuf wire types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    Varint = 0,
    Fixed64 = 1,
    LengthDelimited = 2,
    StartGroup = 3,
    EndGroup = 4,
    Fixed32 = 5,
}

impl WireType {
    fn from_bits(bits: u64) -> Result<Self, WireError> {
        match bits {
            0 => Ok(Self::Varint),
            1 => Ok(Self::Fixed64),
            2 => Ok(Self::LengthDelimited),
            3 => Ok(Self::StartGroup),
            4 => Ok(Self::EndGroup),
            5 => Ok(Self::Fixed32),
            other => Err(WireError::InvalidWireType(other as u8)),
        }
    }
}

/// Malformed input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Input ended in the middle of a value.
    Truncated,
    /// Varint longer than 10 bytes or wider than 64 bits.
    VarintOverflow,
    /// Tag carried wire type 6 or 7.
    InvalidWireType(u8),
    /// Field number 0 or above the protobuf maximum.
    InvalidFieldNumber(u64),
    /// String field is not valid UTF-8.
    InvalidUtf8,
    /// End-group tag without a matching start, or for another field.
    UnbalancedGroup(u32),
    /// Messages or groups nested deeper than the limit.
    RecursionLimit(u32),
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncated => write!(f, "unexpected end of buffer"),
            Self::VarintOverflow => write!(f, "varint overflow (too many bytes for u64)"),
            Self::InvalidWireType(bits) => write!(f, "invalid wire type {}", bits),
            Self::InvalidFieldNumber(n) => write!(f, "invalid field number {}", n),
            Self::InvalidUtf8 => write!(f, "string field is not valid UTF-8"),
            Self::UnbalancedGroup(field) => write!(f, "unbalanced group for field {}", field),
            Self::RecursionLimit(limit) => write!(f, "nesting deeper than {} levels", limit),
        }
    }
}

impl std::error::Error for WireError {}

/// Append-only protobuf writer.
#[derive(Debug, Default, Clone)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_tag(&mut self, field: u32, wire_type: WireType) {
        push_varint((u64::from(field) << 3) | wire_type as u64, &mut self.buf);
    }

    pub fn write_varint(&mut self, value: u64) {
        push_varint(value, &mut self.buf);
    }

    /// `int32`: negative values are sign-extended to ten bytes.
    pub fn write_int32(&mut self, value: i32) {
        self.write_varint(i64::from(value) as u64);
    }

    pub fn write_int64(&mut self, value: i64) {
        self.write_varint(value as u64);
    }

    pub fn write_sint32(&mut self, value: i32) {
        self.write_varint(u64::from(zigzag32(value)));
    }

    pub fn write_sint64(&mut self, value: i64) {
        self.write_varint(zigzag64(value));
    }

    pub fn write_fixed32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_fixed64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Length-prefixed bytes.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as u64);
        self.buf.extend_from_slice(bytes);
    }

    pub fn write_str(&mut self, value: &str) {
        self.write_bytes(value.as_bytes());
    }

    /// Write a length-delimited scope produced by `body`.
    pub fn write_nested<E>(
        &mut self,
        body: impl FnOnce(&mut WireWriter) -> Result<(), E>,
    ) -> Result<(), E> {
        let mut inner = WireWriter::new();
        body(&mut inner)?;
        self.write_bytes(&inner.buf);
        Ok(())
    }
}

/// Cursor over protobuf bytes.
#[derive(Debug, Clone)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
    /// Messages and groups entered above the current position.
    depth: u32,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            depth: 0,
        }
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    fn deeper(&self) -> Result<u32, WireError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(WireError::RecursionLimit(MAX_NESTING_DEPTH));
        }
        Ok(self.depth + 1)
    }

    /// Length-prefixed payload as a reader one nesting level down.
    pub fn read_nested(&mut self) -> Result<WireReader<'a>, WireError> {
        let depth = self.deeper()?;
        let buf = self.read_bytes()?;
        Ok(WireReader { buf, pos: 0, depth })
    }

    /// Enter a group whose start tag was just read.
    pub fn enter_group(&mut self) -> Result<(), WireError> {
        self.depth = self.deeper()?;
        Ok(())
    }

    /// Leave the innermost group after its end tag.
    pub fn leave_group(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub fn is_empty(&self) -> bool {
        self.pos >= self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        if self.remaining() < len {
            return Err(WireError::Truncated);
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn read_varint(&mut self) -> Result<u64, WireError> {
        let (value, consumed) = decode_varint(&self.buf[self.pos.min(self.buf.len())..])?;
        self.pos += consumed;
        Ok(value)
    }

    /// Read a tag, returning `(field, wire_type)`.
    pub fn read_tag(&mut self) -> Result<(u32, WireType), WireError> {
        let raw = self.read_varint()?;
        let field = raw >> 3;
        if field == 0 || field > u64::from(MAX_FIELD_NUMBER) {
            return Err(WireError::InvalidFieldNumber(field));
        }
        Ok((field as u32, WireType::from_bits(raw & 0x7)?))
    }

    pub fn read_int32(&mut self) -> Result<i32, WireError> {
        Ok(self.read_varint()? as i64 as i32)
    }

    pub fn read_int64(&mut self) -> Result<i64, WireError> {
        Ok(self.read_varint()? as i64)
    }

    pub fn read_sint32(&mut self) -> Result<i32, WireError> {
        Ok(unzigzag32(self.read_varint()? as u32))
    }

    pub fn read_sint64(&mut self) -> Result<i64, WireError> {
        Ok(unzigzag64(self.read_varint()?))
    }

    pub fn read_fixed32(&mut self) -> Result<u32, WireError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_fixed64(&mut self) -> Result<u64, WireError> {
        let bytes = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }

    /// Length-prefixed bytes.
    pub fn read_bytes(&mut self) -> Result<&'a [u8], WireError> {
        let len = self.read_varint()?;
        let len = usize::try_from(len).map_err(|_| WireError::Truncated)?;
        self.take(len)
    }

    pub fn read_string(&mut self) -> Result<String, WireError> {
        let bytes = self.read_bytes()?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| WireError::InvalidUtf8)
    }

    /// Skip the payload of a field whose tag was just read.
    pub fn skip(&mut self, field: u32, wire_type: WireType) -> Result<(), WireError> {
        match wire_type {
            WireType::Varint => {
                self.read_varint()?;
            }
            WireType::Fixed64 => {
                self.take(8)?;
            }
            WireType::Fixed32 => {
                self.take(4)?;
            }
            WireType::LengthDelimited => {
                self.read_bytes()?;
            }
            WireType::StartGroup => {
                self.enter_group()?;
                loop {
                    let (inner, inner_type) = self.read_tag()?;
                    if inner_type == WireType::EndGroup {
                        if inner == field {
                            break;
                        }
                        return Err(WireError::UnbalancedGroup(inner));
                    }
                    self.skip(inner, inner_type)?;
                }
                self.leave_group();
            }
            WireType::EndGroup => return Err(WireError::UnbalancedGroup(field)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
