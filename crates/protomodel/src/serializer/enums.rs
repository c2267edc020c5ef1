// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{Serializer, SerializerFeatures};
use crate::error::{Error, Result};
use crate::introspect::EnumShape;
use crate::types::TypeKey;
use crate::value::Value;
use crate::wire::{WireReader, WireType, WireWriter};

/// Enum written as its integer value.
///
/// Plain enums only accept declared values; flag sets accept any combination.
#[derive(Debug)]
pub(crate) struct EnumSerializer {
    key: TypeKey,
    shape: EnumShape,
}

impl EnumSerializer {
    pub(crate) fn new(key: TypeKey, shape: EnumShape) -> Self {
        Self { key, shape }
    }

    fn check(&self, value: i64) -> Result<()> {
        if self.shape.flags || self.shape.variants.iter().any(|v| v.value == value) {
            Ok(())
        } else {
            Err(Error::ValueMismatch {
                expected: format!("a declared value of {}", self.key),
                found: value.to_string(),
            })
        }
    }
}

impl Serializer for EnumSerializer {
    fn type_key(&self) -> &TypeKey {
        &self.key
    }

    fn features(&self) -> SerializerFeatures {
        SerializerFeatures::ENUM
    }

    fn wire_type(&self) -> WireType {
        WireType::Varint
    }

    fn default_value(&self) -> Value {
        Value::Enum(0)
    }

    fn write_payload(&self, value: &Value, out: &mut WireWriter) -> Result<()> {
        let raw = match value {
            Value::Enum(v) => *v,
            Value::I32(v) => i64::from(*v),
            other => return Err(Error::mismatch(format!("enum {}", self.key), other)),
        };
        self.check(raw)?;
        out.write_int64(raw);
        Ok(())
    }

    fn read_payload(&self, input: &mut WireReader<'_>, _existing: Option<Value>) -> Result<Value> {
        let raw = input.read_int64()?;
        self.check(raw)?;
        Ok(Value::Enum(raw))
    }
}
