// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Executable serializers.
//!
//! Every type the model can handle resolves to one [`Serializer`]. Nested
//! types are not bound when a serializer is built: message, repeated and map
//! serializers hold a weak reference to their model and look nested
//! serializers up through its caches when they run, so cyclic graphs
//! (`A` has a `B`, `B` has an `A`) need no special handling.

mod bcl;
mod enums;
mod message;
mod repeated;
mod scalar;
mod wrappers;

pub(crate) use enums::EnumSerializer;
pub(crate) use message::MessageSerializer;
pub(crate) use repeated::{MapSerializer, RepeatedSerializer};
pub(crate) use scalar::ScalarSerializer;
pub(crate) use wrappers::{ExternalHandle, SurrogateSerializer};

use crate::error::{Error, Result};
use crate::model::ModelCore;
use crate::types::{DataFormat, TypeKey};
use crate::value::{MessageValue, Value};
use crate::wire::{WireReader, WireType, WireWriter};
use std::fmt;
use std::sync::{Arc, Weak};

/// Serializer capability flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct SerializerFeatures(pub u16);

impl SerializerFeatures {
    /// Built-in scalar.
    pub const SCALAR: Self = Self(0x0001);

    /// Enum written as its integer value.
    pub const ENUM: Self = Self(0x0002);

    /// Repeated field.
    pub const REPEATED: Self = Self(0x0004);

    /// Map field.
    pub const MAP: Self = Self(0x0008);

    /// Message with members.
    pub const MESSAGE: Self = Self(0x0010);

    /// Part of an inheritance chain (has a base or subtypes).
    pub const INHERITANCE: Self = Self(0x0020);

    /// Instances come from the model's default factory.
    pub const FACTORY: Self = Self(0x0040);

    /// Values travel as another type.
    pub const SURROGATE: Self = Self(0x0080);

    /// Wraps a serializer supplied from outside the model.
    pub const EXTERNAL: Self = Self(0x0100);

    /// Empty flags
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Check if flag is set
    pub const fn contains(self, flag: Self) -> bool {
        (self.0 & flag.0) != 0
    }
}

impl std::ops::BitOr for SerializerFeatures {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Reads and writes values of one type.
///
/// `write_payload`/`read_payload` handle a single value without its tag.
/// `write_field`/`read_field` handle it as field of an enclosing message, and
/// `write`/`read` as a whole stream; both have defaults in terms of the
/// payload methods.
pub trait Serializer: Send + Sync + fmt::Debug {
    fn type_key(&self) -> &TypeKey;

    fn features(&self) -> SerializerFeatures;

    /// Wire type of one value.
    fn wire_type(&self) -> WireType;

    /// Value produced when the stream carries nothing.
    fn default_value(&self) -> Value;

    fn write_payload(&self, value: &Value, out: &mut WireWriter) -> Result<()>;

    /// Read one value; `existing` is the current field value for merging.
    fn read_payload(&self, input: &mut WireReader<'_>, existing: Option<Value>) -> Result<Value>;

    fn write_field(&self, field: u32, value: &Value, out: &mut WireWriter) -> Result<()> {
        out.write_tag(field, self.wire_type());
        self.write_payload(value, out)
    }

    /// Read a field whose tag (`field`, `wire_type`) was just consumed.
    fn read_field(
        &self,
        field: u32,
        wire_type: WireType,
        input: &mut WireReader<'_>,
        existing: Option<Value>,
    ) -> Result<Value> {
        let _ = field;
        expect_wire(self.wire_type(), wire_type)?;
        self.read_payload(input, existing)
    }

    /// Write a whole stream. Non-message values are written as field 1.
    fn write(&self, value: &Value, out: &mut WireWriter) -> Result<()> {
        self.write_field(1, value, out)
    }

    /// Read a whole stream.
    fn read(&self, input: &mut WireReader<'_>, existing: Option<Value>) -> Result<Value> {
        let mut current = existing;
        while !input.is_empty() {
            let (field, wire_type) = input.read_tag()?;
            if field == 1 {
                current = Some(read_element(self, field, wire_type, input, current)?);
            } else {
                input.skip(field, wire_type)?;
            }
        }
        Ok(current.unwrap_or_else(|| self.default_value()))
    }

    /// Write as a start/end group pair.
    fn write_group(&self, field: u32, value: &Value, out: &mut WireWriter) -> Result<()> {
        let _ = (field, value, out);
        Err(Error::NotSupported(format!(
            "{} cannot be written as a group",
            self.type_key()
        )))
    }

    /// Read a group whose start tag was just consumed.
    fn read_group(
        &self,
        field: u32,
        input: &mut WireReader<'_>,
        existing: Option<Value>,
    ) -> Result<Value> {
        let _ = (field, input, existing);
        Err(Error::NotSupported(format!(
            "{} cannot be read as a group",
            self.type_key()
        )))
    }

    /// Write the part of `value` owned by this level of an inheritance chain.
    fn write_subtype(&self, value: &MessageValue, out: &mut WireWriter) -> Result<()> {
        let _ = (value, out);
        Err(Error::NotSupported(format!(
            "{} is not part of an inheritance chain",
            self.type_key()
        )))
    }

    /// Merge this level's fields into `target`.
    fn merge_subtype(&self, input: &mut WireReader<'_>, target: &mut MessageValue) -> Result<()> {
        let _ = (input, target);
        Err(Error::NotSupported(format!(
            "{} is not part of an inheritance chain",
            self.type_key()
        )))
    }

    /// Service wrapped by this serializer, returned from resolution in its place.
    fn external(&self) -> Option<Arc<dyn Serializer>> {
        None
    }
}

// ============================================================================
// Helpers shared by the implementations
// ============================================================================

pub(crate) fn upgrade(model: &Weak<ModelCore>) -> Result<Arc<ModelCore>> {
    model.upgrade().ok_or(Error::ModelDropped)
}

pub(crate) fn expect_wire(expected: WireType, found: WireType) -> Result<()> {
    if expected == found {
        Ok(())
    } else {
        Err(Error::ValueMismatch {
            expected: format!("{:?} wire type", expected),
            found: format!("{:?} wire type", found),
        })
    }
}

/// Whether the serializer's values may share a packed run.
pub(crate) fn is_packable(serializer: &dyn Serializer) -> bool {
    serializer
        .features()
        .contains(SerializerFeatures::SCALAR | SerializerFeatures::ENUM)
        && serializer.wire_type() != WireType::LengthDelimited
}

/// Write a field, as a group when the member asks for it and the type allows.
pub(crate) fn write_element(
    serializer: &dyn Serializer,
    field: u32,
    format: DataFormat,
    value: &Value,
    out: &mut WireWriter,
) -> Result<()> {
    if format == DataFormat::Group && serializer.features().contains(SerializerFeatures::MESSAGE) {
        serializer.write_group(field, value, out)
    } else {
        serializer.write_field(field, value, out)
    }
}

/// Read a field in whichever framing the stream used.
pub(crate) fn read_element<S: Serializer + ?Sized>(
    serializer: &S,
    field: u32,
    wire_type: WireType,
    input: &mut WireReader<'_>,
    existing: Option<Value>,
) -> Result<Value> {
    if wire_type == WireType::StartGroup {
        serializer.read_group(field, input, existing)
    } else {
        serializer.read_field(field, wire_type, input, existing)
    }
}
