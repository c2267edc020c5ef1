// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Built-in ("basic") types that never get a descriptor.

use super::{DataFormat, TypeKey};
use crate::wire::WireType;

/// Built-in scalar kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarKind {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    Char,
    F32,
    F64,
    Decimal,
    String,
    Bytes,
    Guid,
    DateTime,
    TimeSpan,
    Uri,
    TypeName,
    /// Pointer-sized integer: serializable, but has no schema mapping.
    NativeInt,
}

/// Canonical key names, `builtin.` namespace.
const CANONICAL: &[(ScalarKind, &str)] = &[
    (ScalarKind::Bool, "builtin.bool"),
    (ScalarKind::I8, "builtin.i8"),
    (ScalarKind::U8, "builtin.u8"),
    (ScalarKind::I16, "builtin.i16"),
    (ScalarKind::U16, "builtin.u16"),
    (ScalarKind::I32, "builtin.i32"),
    (ScalarKind::U32, "builtin.u32"),
    (ScalarKind::I64, "builtin.i64"),
    (ScalarKind::U64, "builtin.u64"),
    (ScalarKind::Char, "builtin.char"),
    (ScalarKind::F32, "builtin.f32"),
    (ScalarKind::F64, "builtin.f64"),
    (ScalarKind::Decimal, "builtin.decimal"),
    (ScalarKind::String, "builtin.string"),
    (ScalarKind::Bytes, "builtin.bytes"),
    (ScalarKind::Guid, "builtin.guid"),
    (ScalarKind::DateTime, "builtin.datetime"),
    (ScalarKind::TimeSpan, "builtin.timespan"),
    (ScalarKind::Uri, "builtin.uri"),
    (ScalarKind::TypeName, "builtin.type"),
    (ScalarKind::NativeInt, "builtin.isize"),
];

/// Rust spellings recognised in addition to the canonical names
/// (as produced by [`TypeKey::of`]).
const RUST_ALIASES: &[(&str, ScalarKind)] = &[
    ("bool", ScalarKind::Bool),
    ("i8", ScalarKind::I8),
    ("u8", ScalarKind::U8),
    ("i16", ScalarKind::I16),
    ("u16", ScalarKind::U16),
    ("i32", ScalarKind::I32),
    ("u32", ScalarKind::U32),
    ("i64", ScalarKind::I64),
    ("u64", ScalarKind::U64),
    ("char", ScalarKind::Char),
    ("f32", ScalarKind::F32),
    ("f64", ScalarKind::F64),
    ("isize", ScalarKind::NativeInt),
    ("usize", ScalarKind::NativeInt),
    ("&str", ScalarKind::String),
    ("alloc.string.String", ScalarKind::String),
    ("alloc.vec.Vec<u8>", ScalarKind::Bytes),
    ("std.time.SystemTime", ScalarKind::DateTime),
    ("core.time.Duration", ScalarKind::TimeSpan),
];

impl ScalarKind {
    /// Recognise a built-in from its key.
    pub fn from_key(key: &TypeKey) -> Option<Self> {
        let name = key.name();
        CANONICAL
            .iter()
            .find(|(_, canonical)| *canonical == name)
            .map(|(kind, _)| *kind)
            .or_else(|| {
                RUST_ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == name)
                    .map(|(_, kind)| *kind)
            })
    }

    /// Canonical key for this kind.
    pub fn key(self) -> TypeKey {
        TypeKey::new(self.canonical_name())
    }

    pub fn canonical_name(self) -> &'static str {
        CANONICAL
            .iter()
            .find(|(kind, _)| *kind == self)
            .map_or("builtin.unknown", |(_, name)| *name)
    }

    /// Wire type used for a single value of this kind.
    pub fn wire_type(self, format: DataFormat) -> WireType {
        match self {
            Self::Bool => WireType::Varint,
            Self::I8 | Self::U8 | Self::I16 | Self::U16 | Self::I32 | Self::U32 | Self::Char => {
                if format == DataFormat::FixedSize {
                    WireType::Fixed32
                } else {
                    WireType::Varint
                }
            }
            Self::I64 | Self::U64 | Self::NativeInt => {
                if format == DataFormat::FixedSize {
                    WireType::Fixed64
                } else {
                    WireType::Varint
                }
            }
            Self::F32 => WireType::Fixed32,
            Self::F64 => WireType::Fixed64,
            Self::Decimal
            | Self::String
            | Self::Bytes
            | Self::Guid
            | Self::DateTime
            | Self::TimeSpan
            | Self::Uri
            | Self::TypeName => WireType::LengthDelimited,
        }
    }

    /// Whether repeated values of this kind may use packed encoding.
    pub fn is_packable(self) -> bool {
        !matches!(
            self.wire_type(DataFormat::Default),
            WireType::LengthDelimited
        )
    }

    /// Whether the kind may be the key of a native protobuf map.
    pub fn is_valid_map_key(self) -> bool {
        matches!(
            self,
            Self::Bool
                | Self::I8
                | Self::U8
                | Self::I16
                | Self::U16
                | Self::I32
                | Self::U32
                | Self::I64
                | Self::U64
                | Self::Char
                | Self::String
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_key_canonical_and_alias() {
        assert_eq!(
            ScalarKind::from_key(&TypeKey::new("builtin.i32")),
            Some(ScalarKind::I32)
        );
        assert_eq!(
            ScalarKind::from_key(&TypeKey::of::<String>()),
            Some(ScalarKind::String)
        );
        assert_eq!(ScalarKind::from_key(&TypeKey::new("Demo.Point")), None);
    }

    #[test]
    fn test_key_roundtrip() {
        for (kind, _) in CANONICAL {
            assert_eq!(ScalarKind::from_key(&kind.key()), Some(*kind));
        }
    }

    #[test]
    fn test_wire_type_follows_format() {
        assert_eq!(ScalarKind::I32.wire_type(DataFormat::Default), WireType::Varint);
        assert_eq!(ScalarKind::I32.wire_type(DataFormat::FixedSize), WireType::Fixed32);
        assert_eq!(ScalarKind::U64.wire_type(DataFormat::FixedSize), WireType::Fixed64);
        assert_eq!(
            ScalarKind::DateTime.wire_type(DataFormat::Default),
            WireType::LengthDelimited
        );
    }

    #[test]
    fn test_map_keys() {
        assert!(ScalarKind::String.is_valid_map_key());
        assert!(ScalarKind::I64.is_valid_map_key());
        assert!(!ScalarKind::F64.is_valid_map_key());
        assert!(!ScalarKind::Bytes.is_valid_map_key());
    }
}
