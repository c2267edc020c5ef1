// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Repeated fields and maps.

use super::{
    expect_wire, is_packable, read_element, upgrade, write_element, Serializer,
    SerializerFeatures,
};
use crate::error::{Error, Result};
use crate::model::ModelCore;
use crate::types::{CompatibilityLevel, DataFormat, TypeKey};
use crate::value::Value;
use crate::wire::{WireReader, WireType, WireWriter};
use std::sync::{Arc, Weak};

fn no_single_payload(key: &TypeKey) -> Error {
    Error::NotSupported(format!(
        "{} is repeated; nested collections have no single-value encoding",
        key
    ))
}

/// One field entry per item, or a packed run for packable items.
#[derive(Debug)]
pub(crate) struct RepeatedSerializer {
    key: TypeKey,
    item: TypeKey,
    format: DataFormat,
    packed: bool,
    level: CompatibilityLevel,
    model: Weak<ModelCore>,
}

impl RepeatedSerializer {
    pub(crate) fn new(
        key: TypeKey,
        item: TypeKey,
        format: DataFormat,
        packed: bool,
        level: CompatibilityLevel,
        model: Weak<ModelCore>,
    ) -> Self {
        Self {
            key,
            item,
            format,
            packed,
            level,
            model,
        }
    }

    fn item_serializer(&self) -> Result<Arc<dyn Serializer>> {
        upgrade(&self.model)?.element_serializer(&self.item, self.format, self.level)
    }
}

impl Serializer for RepeatedSerializer {
    fn type_key(&self) -> &TypeKey {
        &self.key
    }

    fn features(&self) -> SerializerFeatures {
        SerializerFeatures::REPEATED
    }

    fn wire_type(&self) -> WireType {
        WireType::LengthDelimited
    }

    fn default_value(&self) -> Value {
        Value::List(Vec::new())
    }

    fn write_payload(&self, _value: &Value, _out: &mut WireWriter) -> Result<()> {
        Err(no_single_payload(&self.key))
    }

    fn read_payload(&self, _input: &mut WireReader<'_>, _existing: Option<Value>) -> Result<Value> {
        Err(no_single_payload(&self.key))
    }

    fn write_field(&self, field: u32, value: &Value, out: &mut WireWriter) -> Result<()> {
        let items = value
            .as_list()
            .ok_or_else(|| Error::mismatch(format!("list of {}", self.item), value))?;
        if items.is_empty() {
            return Ok(());
        }
        let item = self.item_serializer()?;
        if let Some(null) = items.iter().find(|v| v.is_null()) {
            return Err(Error::mismatch(self.item.to_string(), null));
        }

        if self.packed && is_packable(&*item) {
            out.write_tag(field, WireType::LengthDelimited);
            out.write_nested(|w| {
                items
                    .iter()
                    .try_for_each(|v| item.write_payload(v, w))
            })
        } else {
            items
                .iter()
                .try_for_each(|v| write_element(&*item, field, self.format, v, out))
        }
    }

    fn read_field(
        &self,
        field: u32,
        wire_type: WireType,
        input: &mut WireReader<'_>,
        existing: Option<Value>,
    ) -> Result<Value> {
        let mut items = match existing {
            Some(Value::List(items)) => items,
            _ => Vec::new(),
        };
        let item = self.item_serializer()?;

        // Packed and unpacked encodings are both accepted for packable items.
        if wire_type == WireType::LengthDelimited && is_packable(&*item) {
            let mut run = input.read_nested()?;
            while !run.is_empty() {
                items.push(item.read_payload(&mut run, None)?);
            }
        } else {
            items.push(read_element(&*item, field, wire_type, input, None)?);
        }
        Ok(Value::List(items))
    }
}

/// Map entries as `{ key = 1; value = 2; }` messages.
///
/// The same layout as the key/value pair message used for maps that are not
/// valid protobuf maps, so both read each other's output.
#[derive(Debug)]
pub(crate) struct MapSerializer {
    key: TypeKey,
    key_type: TypeKey,
    value_type: TypeKey,
    key_format: DataFormat,
    value_format: DataFormat,
    level: CompatibilityLevel,
    model: Weak<ModelCore>,
}

impl MapSerializer {
    pub(crate) fn new(
        key: TypeKey,
        key_type: TypeKey,
        value_type: TypeKey,
        key_format: DataFormat,
        value_format: DataFormat,
        level: CompatibilityLevel,
        model: Weak<ModelCore>,
    ) -> Self {
        Self {
            key,
            key_type,
            value_type,
            key_format,
            value_format,
            level,
            model,
        }
    }

    fn entry_serializers(&self) -> Result<(Arc<dyn Serializer>, Arc<dyn Serializer>)> {
        let core = upgrade(&self.model)?;
        let key = core.element_serializer(&self.key_type, self.key_format, self.level)?;
        let value = core.field_serializer(
            &self.value_type,
            self.value_format,
            false,
            DataFormat::Default,
            self.level,
        )?;
        Ok((key, value))
    }
}

impl Serializer for MapSerializer {
    fn type_key(&self) -> &TypeKey {
        &self.key
    }

    fn features(&self) -> SerializerFeatures {
        SerializerFeatures::MAP
    }

    fn wire_type(&self) -> WireType {
        WireType::LengthDelimited
    }

    fn default_value(&self) -> Value {
        Value::Map(Vec::new())
    }

    fn write_payload(&self, _value: &Value, _out: &mut WireWriter) -> Result<()> {
        Err(no_single_payload(&self.key))
    }

    fn read_payload(&self, _input: &mut WireReader<'_>, _existing: Option<Value>) -> Result<Value> {
        Err(no_single_payload(&self.key))
    }

    fn write_field(&self, field: u32, value: &Value, out: &mut WireWriter) -> Result<()> {
        let Value::Map(entries) = value else {
            return Err(Error::mismatch(
                format!("map<{}, {}>", self.key_type, self.value_type),
                value,
            ));
        };
        if entries.is_empty() {
            return Ok(());
        }
        let (key_ser, value_ser) = self.entry_serializers()?;
        for (k, v) in entries {
            out.write_tag(field, WireType::LengthDelimited);
            out.write_nested(|w| {
                key_ser.write_field(1, k, w)?;
                if v.is_null() {
                    return Ok(());
                }
                write_element(&*value_ser, 2, self.value_format, v, w)
            })?;
        }
        Ok(())
    }

    fn read_field(
        &self,
        _field: u32,
        wire_type: WireType,
        input: &mut WireReader<'_>,
        existing: Option<Value>,
    ) -> Result<Value> {
        expect_wire(WireType::LengthDelimited, wire_type)?;
        let mut entries = match existing {
            Some(Value::Map(entries)) => entries,
            _ => Vec::new(),
        };
        let (key_ser, value_ser) = self.entry_serializers()?;

        let mut entry = input.read_nested()?;
        let (mut key, mut value) = (None, None);
        while !entry.is_empty() {
            match entry.read_tag()? {
                (1, wt) => key = Some(key_ser.read_field(1, wt, &mut entry, key.take())?),
                (2, wt) => value = Some(read_element(&*value_ser, 2, wt, &mut entry, value.take())?),
                (other, wt) => entry.skip(other, wt)?,
            }
        }
        entries.push((
            key.unwrap_or_else(|| key_ser.default_value()),
            value.unwrap_or_else(|| value_ser.default_value()),
        ));
        Ok(Value::Map(entries))
    }
}
