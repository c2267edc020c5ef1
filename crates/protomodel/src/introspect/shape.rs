// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Declared serialization shape of a runtime type.
//!
//! Shapes are what a [`TypeIntrospector`](super::TypeIntrospector) reports.
//! The model copies them into descriptors once, at creation time.

use crate::types::{CompatibilityLevel, DataFormat, ScalarKind, TypeKey};

/// How a type was recognised as serializable. Decided once per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContractFamily {
    /// No serialization markers.
    #[default]
    None,
    /// Explicit contract with numbered members.
    Explicit,
    /// Members inferred from public fields.
    ImplicitFields,
    /// Value-like type serialized positionally (key/value pairs, tuples).
    AutoTuple,
}

/// Everything the model needs to know about one type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeShape {
    /// Optional/nullable wrapper; resolves to the inner type.
    Nullable(TypeKey),
    Enum(EnumShape),
    /// Repeated values of the item type.
    Collection(TypeKey),
    /// Dictionary from key type to value type.
    Map(TypeKey, TypeKey),
    Message(MessageShape),
}

/// One enum variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVariant {
    pub name: String,
    pub value: i64,
}

/// Shape of an enumerated type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumShape {
    pub name: Option<String>,
    pub variants: Vec<EnumVariant>,
    pub underlying: ScalarKind,
    pub flags: bool,
}

impl EnumShape {
    pub fn new() -> Self {
        Self {
            name: None,
            variants: Vec::new(),
            underlying: ScalarKind::I32,
            flags: false,
        }
    }

    pub fn variant(mut self, name: impl Into<String>, value: i64) -> Self {
        self.variants.push(EnumVariant {
            name: name.into(),
            value,
        });
        self
    }

    pub fn underlying(mut self, kind: ScalarKind) -> Self {
        self.underlying = kind;
        self
    }

    pub fn flags(mut self) -> Self {
        self.flags = true;
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Plain protobuf enum: int32-compatible values and not a bit-flag set.
    pub fn is_valid(&self) -> bool {
        !self.flags
            && matches!(
                self.underlying,
                ScalarKind::I8 | ScalarKind::U8 | ScalarKind::I16 | ScalarKind::U16 | ScalarKind::I32
            )
            && self
                .variants
                .iter()
                .all(|v| i32::try_from(v.value).is_ok())
    }
}

impl Default for EnumShape {
    fn default() -> Self {
        Self::new()
    }
}

/// One declared field of a message.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldShape {
    pub number: u32,
    pub name: String,
    pub ty: TypeKey,
    pub format: DataFormat,
    pub map_key_format: DataFormat,
    pub required: bool,
    pub packed: bool,
    pub as_reference: bool,
    pub dynamic_type: bool,
    pub compatibility: CompatibilityLevel,
    /// Proto2 default literal, emitted verbatim.
    pub default_value: Option<String>,
}

impl FieldShape {
    pub fn new(number: u32, name: impl Into<String>, ty: impl Into<TypeKey>) -> Self {
        Self {
            number,
            name: name.into(),
            ty: ty.into(),
            format: DataFormat::Default,
            map_key_format: DataFormat::Default,
            required: false,
            packed: false,
            as_reference: false,
            dynamic_type: false,
            compatibility: CompatibilityLevel::NotSpecified,
            default_value: None,
        }
    }

    pub fn format(mut self, format: DataFormat) -> Self {
        self.format = format;
        self
    }

    pub fn map_key_format(mut self, format: DataFormat) -> Self {
        self.map_key_format = format;
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn packed(mut self) -> Self {
        self.packed = true;
        self
    }

    pub fn as_reference(mut self) -> Self {
        self.as_reference = true;
        self
    }

    pub fn dynamic_type(mut self) -> Self {
        self.dynamic_type = true;
        self
    }

    pub fn compatibility(mut self, level: CompatibilityLevel) -> Self {
        self.compatibility = level;
        self
    }

    pub fn default_value(mut self, literal: impl Into<String>) -> Self {
        self.default_value = Some(literal.into());
        self
    }
}

/// Shape of a message (struct/class) type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MessageShape {
    pub family: ContractFamily,
    pub name: Option<String>,
    pub fields: Vec<FieldShape>,
    pub base: Option<TypeKey>,
    /// Declared subtypes with the field number carrying each one.
    pub subtypes: Vec<(u32, TypeKey)>,
    pub surrogate: Option<TypeKey>,
    pub generic_args: Vec<TypeKey>,
    /// Item type when the type also behaves as a collection.
    pub collection_item: Option<TypeKey>,
    pub ignore_collection_handling: bool,
    pub compatibility: CompatibilityLevel,
    /// The type brings its own serializer.
    pub external: bool,
}

impl MessageShape {
    /// Explicit contract with no members yet.
    pub fn contract() -> Self {
        Self {
            family: ContractFamily::Explicit,
            ..Self::default()
        }
    }

    /// Positional value type.
    pub fn auto_tuple() -> Self {
        Self {
            family: ContractFamily::AutoTuple,
            ..Self::default()
        }
    }

    /// Type without serialization markers.
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn field(mut self, number: u32, name: impl Into<String>, ty: impl Into<TypeKey>) -> Self {
        self.fields.push(FieldShape::new(number, name, ty));
        self
    }

    pub fn with_field(mut self, field: FieldShape) -> Self {
        self.fields.push(field);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn base(mut self, base: impl Into<TypeKey>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn subtype(mut self, number: u32, ty: impl Into<TypeKey>) -> Self {
        self.subtypes.push((number, ty.into()));
        self
    }

    pub fn surrogate(mut self, ty: impl Into<TypeKey>) -> Self {
        self.surrogate = Some(ty.into());
        self
    }

    pub fn generic_arg(mut self, ty: impl Into<TypeKey>) -> Self {
        self.generic_args.push(ty.into());
        self
    }

    pub fn collection_of(mut self, item: impl Into<TypeKey>) -> Self {
        self.collection_item = Some(item.into());
        self
    }

    pub fn ignore_collection_handling(mut self) -> Self {
        self.ignore_collection_handling = true;
        self
    }

    pub fn compatibility(mut self, level: CompatibilityLevel) -> Self {
        self.compatibility = level;
        self
    }

    pub fn external(mut self) -> Self {
        self.external = true;
        self
    }
}
