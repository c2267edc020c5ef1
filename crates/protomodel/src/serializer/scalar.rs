// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Built-in scalar serializers.

use super::{bcl, Serializer, SerializerFeatures};
use crate::error::{Error, Result};
use crate::types::{CompatibilityLevel, DataFormat, ScalarKind, TypeKey};
use crate::value::Value;
use crate::wire::{WireReader, WireType, WireWriter};

/// Serializer for one (kind, format, level) combination.
#[derive(Debug)]
pub(crate) struct ScalarSerializer {
    key: TypeKey,
    kind: ScalarKind,
    format: DataFormat,
    level: CompatibilityLevel,
}

impl ScalarSerializer {
    pub(crate) fn new(kind: ScalarKind, format: DataFormat, level: CompatibilityLevel) -> Self {
        Self {
            key: kind.key(),
            kind,
            format,
            level: level.effective(),
        }
    }

    fn well_known_time(&self) -> bool {
        self.format == DataFormat::WellKnown || self.level.uses_well_known_time()
    }
}

impl Serializer for ScalarSerializer {
    fn type_key(&self) -> &TypeKey {
        &self.key
    }

    fn features(&self) -> SerializerFeatures {
        SerializerFeatures::SCALAR
    }

    fn wire_type(&self) -> WireType {
        self.kind.wire_type(self.format)
    }

    fn default_value(&self) -> Value {
        match self.kind {
            ScalarKind::Bool => Value::Bool(false),
            ScalarKind::I8 | ScalarKind::I16 | ScalarKind::I32 => Value::I32(0),
            ScalarKind::U8 | ScalarKind::U16 | ScalarKind::U32 | ScalarKind::Char => Value::U32(0),
            ScalarKind::I64 | ScalarKind::NativeInt => Value::I64(0),
            ScalarKind::U64 => Value::U64(0),
            ScalarKind::F32 => Value::F32(0.0),
            ScalarKind::F64 => Value::F64(0.0),
            ScalarKind::Decimal => Value::String("0".to_string()),
            ScalarKind::Guid => Value::String("00000000-0000-0000-0000-000000000000".to_string()),
            ScalarKind::String | ScalarKind::Uri | ScalarKind::TypeName => {
                Value::String(String::new())
            }
            ScalarKind::Bytes => Value::Bytes(Vec::new()),
            ScalarKind::DateTime => Value::Timestamp {
                seconds: 0,
                nanos: 0,
            },
            ScalarKind::TimeSpan => Value::Duration {
                seconds: 0,
                nanos: 0,
            },
        }
    }

    fn write_payload(&self, value: &Value, out: &mut WireWriter) -> Result<()> {
        let fixed = self.format == DataFormat::FixedSize;
        let zigzag = self.format == DataFormat::ZigZag;
        match (self.kind, value) {
            (ScalarKind::Bool, Value::Bool(v)) => out.write_varint(u64::from(*v)),

            (ScalarKind::I8 | ScalarKind::I16 | ScalarKind::I32, Value::I32(v)) => {
                if fixed {
                    out.write_fixed32(*v as u32);
                } else if zigzag {
                    out.write_sint32(*v);
                } else {
                    out.write_int32(*v);
                }
            }
            (
                ScalarKind::U8 | ScalarKind::U16 | ScalarKind::U32 | ScalarKind::Char,
                Value::U32(v),
            ) => {
                if fixed {
                    out.write_fixed32(*v);
                } else {
                    out.write_varint(u64::from(*v));
                }
            }
            (ScalarKind::I64 | ScalarKind::NativeInt, Value::I64(v)) => {
                if fixed {
                    out.write_fixed64(*v as u64);
                } else if zigzag {
                    out.write_sint64(*v);
                } else {
                    out.write_int64(*v);
                }
            }
            (ScalarKind::U64, Value::U64(v)) => {
                if fixed {
                    out.write_fixed64(*v);
                } else {
                    out.write_varint(*v);
                }
            }
            (ScalarKind::F32, Value::F32(v)) => out.write_fixed32(v.to_bits()),
            (ScalarKind::F64, Value::F64(v)) => out.write_fixed64(v.to_bits()),

            (ScalarKind::String | ScalarKind::Uri | ScalarKind::TypeName, Value::String(v)) => {
                out.write_str(v);
            }
            (ScalarKind::Bytes, Value::Bytes(v)) => out.write_bytes(v),

            (ScalarKind::DateTime, Value::Timestamp { seconds, nanos })
            | (ScalarKind::TimeSpan, Value::Duration { seconds, nanos }) => {
                if self.well_known_time() {
                    out.write_nested::<Error>(|w| {
                        bcl::write_well_known_time(*seconds, *nanos, w);
                        Ok(())
                    })?;
                } else {
                    out.write_nested(|w| bcl::write_scaled_time(*seconds, *nanos, w))?;
                }
            }
            (ScalarKind::Decimal, Value::String(v)) => {
                if self.level.uses_plain_strings() {
                    out.write_str(v);
                } else {
                    out.write_nested(|w| bcl::write_decimal(v, w))?;
                }
            }
            (ScalarKind::Guid, Value::String(v)) => {
                if self.level.uses_plain_strings() {
                    if fixed {
                        out.write_bytes(&bcl::guid_to_bytes(v)?);
                    } else {
                        out.write_str(v);
                    }
                } else {
                    out.write_nested(|w| bcl::write_guid(v, w))?;
                }
            }

            (kind, other) => return Err(Error::mismatch(kind.canonical_name(), other)),
        }
        Ok(())
    }

    fn read_payload(&self, input: &mut WireReader<'_>, _existing: Option<Value>) -> Result<Value> {
        let fixed = self.format == DataFormat::FixedSize;
        let zigzag = self.format == DataFormat::ZigZag;
        let value = match self.kind {
            ScalarKind::Bool => Value::Bool(input.read_varint()? != 0),
            ScalarKind::I8 | ScalarKind::I16 | ScalarKind::I32 => Value::I32(if fixed {
                input.read_fixed32()? as i32
            } else if zigzag {
                input.read_sint32()?
            } else {
                input.read_int32()?
            }),
            ScalarKind::U8 | ScalarKind::U16 | ScalarKind::U32 | ScalarKind::Char => {
                Value::U32(if fixed {
                    input.read_fixed32()?
                } else {
                    input.read_varint()? as u32
                })
            }
            ScalarKind::I64 | ScalarKind::NativeInt => Value::I64(if fixed {
                input.read_fixed64()? as i64
            } else if zigzag {
                input.read_sint64()?
            } else {
                input.read_int64()?
            }),
            ScalarKind::U64 => Value::U64(if fixed {
                input.read_fixed64()?
            } else {
                input.read_varint()?
            }),
            ScalarKind::F32 => Value::F32(f32::from_bits(input.read_fixed32()?)),
            ScalarKind::F64 => Value::F64(f64::from_bits(input.read_fixed64()?)),
            ScalarKind::String | ScalarKind::Uri | ScalarKind::TypeName => {
                Value::String(input.read_string()?)
            }
            ScalarKind::Bytes => Value::Bytes(input.read_bytes()?.to_vec()),
            ScalarKind::DateTime | ScalarKind::TimeSpan => {
                let mut body = input.read_nested()?;
                let (seconds, nanos) = if self.well_known_time() {
                    bcl::read_well_known_time(&mut body)?
                } else {
                    bcl::read_scaled_time(&mut body)?
                };
                if self.kind == ScalarKind::DateTime {
                    Value::Timestamp { seconds, nanos }
                } else {
                    Value::Duration { seconds, nanos }
                }
            }
            ScalarKind::Decimal => {
                if self.level.uses_plain_strings() {
                    Value::String(input.read_string()?)
                } else {
                    Value::String(bcl::read_decimal(&mut input.read_nested()?)?)
                }
            }
            ScalarKind::Guid => {
                if self.level.uses_plain_strings() {
                    if fixed {
                        Value::String(bcl::guid_from_bytes(input.read_bytes()?)?)
                    } else {
                        Value::String(input.read_string()?)
                    }
                } else {
                    Value::String(bcl::read_guid(&mut input.read_nested()?)?)
                }
            }
        };
        Ok(value)
    }
}
