// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! `.proto` spelling of built-in scalars.

use super::ImportFlags;
use crate::error::{Error, Result};
use crate::types::{CompatibilityLevel, DataFormat, ScalarKind};

/// Protobuf type of a built-in scalar, plus the import it needs.
///
/// Pure: depends on nothing but its arguments.
pub(crate) fn scalar_type_name(
    kind: ScalarKind,
    format: DataFormat,
    level: CompatibilityLevel,
) -> Result<(&'static str, ImportFlags)> {
    let fixed = format == DataFormat::FixedSize;
    let zigzag = format == DataFormat::ZigZag;
    let well_known = format == DataFormat::WellKnown || level.uses_well_known_time();

    let mapped = match kind {
        ScalarKind::Bool => "bool",
        ScalarKind::I8 | ScalarKind::I16 | ScalarKind::I32 => {
            if fixed {
                "sfixed32"
            } else if zigzag {
                "sint32"
            } else {
                "int32"
            }
        }
        ScalarKind::U8 | ScalarKind::U16 | ScalarKind::U32 | ScalarKind::Char => {
            if fixed {
                "fixed32"
            } else {
                "uint32"
            }
        }
        ScalarKind::I64 => {
            if fixed {
                "sfixed64"
            } else if zigzag {
                "sint64"
            } else {
                "int64"
            }
        }
        ScalarKind::U64 => {
            if fixed {
                "fixed64"
            } else {
                "uint64"
            }
        }
        ScalarKind::F32 => "float",
        ScalarKind::F64 => "double",
        ScalarKind::String | ScalarKind::Uri | ScalarKind::TypeName => "string",
        ScalarKind::Bytes => "bytes",
        ScalarKind::DateTime => {
            return Ok(if well_known {
                (".google.protobuf.Timestamp", ImportFlags::TIMESTAMP)
            } else {
                (".bcl.DateTime", ImportFlags::BCL)
            });
        }
        ScalarKind::TimeSpan => {
            return Ok(if well_known {
                (".google.protobuf.Duration", ImportFlags::DURATION)
            } else {
                (".bcl.TimeSpan", ImportFlags::BCL)
            });
        }
        ScalarKind::Decimal => {
            return Ok(if level.uses_plain_strings() {
                ("string", ImportFlags::empty())
            } else {
                (".bcl.Decimal", ImportFlags::BCL)
            });
        }
        ScalarKind::Guid => {
            return Ok(match (level.uses_plain_strings(), fixed) {
                (true, true) => ("bytes", ImportFlags::empty()),
                (true, false) => ("string", ImportFlags::empty()),
                (false, _) => (".bcl.Guid", ImportFlags::BCL),
            });
        }
        ScalarKind::NativeInt => {
            return Err(Error::NotSupported(format!(
                "{} has no protobuf mapping",
                kind.canonical_name()
            )));
        }
    };
    Ok((mapped, ImportFlags::empty()))
}

/// Name used for a scalar inside generated names (`Pair_Int32_String`).
pub(crate) fn scalar_display_name(kind: ScalarKind) -> &'static str {
    match kind {
        ScalarKind::Bool => "Boolean",
        ScalarKind::I8 => "SByte",
        ScalarKind::U8 => "Byte",
        ScalarKind::I16 => "Int16",
        ScalarKind::U16 => "UInt16",
        ScalarKind::I32 => "Int32",
        ScalarKind::U32 => "UInt32",
        ScalarKind::I64 => "Int64",
        ScalarKind::U64 => "UInt64",
        ScalarKind::Char => "Char",
        ScalarKind::F32 => "Single",
        ScalarKind::F64 => "Double",
        ScalarKind::Decimal => "Decimal",
        ScalarKind::String => "String",
        ScalarKind::Bytes => "Bytes",
        ScalarKind::Guid => "Guid",
        ScalarKind::DateTime => "DateTime",
        ScalarKind::TimeSpan => "TimeSpan",
        ScalarKind::Uri => "Uri",
        ScalarKind::TypeName => "Type",
        ScalarKind::NativeInt => "IntPtr",
    }
}
