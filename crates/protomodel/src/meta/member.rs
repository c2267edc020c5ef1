// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Members and subtypes of a descriptor.

use crate::config::{MAX_FIELD_NUMBER, MIN_FIELD_NUMBER, RESERVED_FIELD_END, RESERVED_FIELD_START};
use crate::error::{Error, Result};
use crate::introspect::FieldShape;
use crate::types::{CompatibilityLevel, DataFormat, TypeKey};

/// One serializable field of a descriptor.
///
/// Read-only: members change only through the owning
/// [`MetaType`](super::MetaType), which validates them.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueMember {
    shape: FieldShape,
}

impl ValueMember {
    pub fn number(&self) -> u32 {
        self.shape.number
    }

    pub fn name(&self) -> &str {
        &self.shape.name
    }

    /// Declared value type.
    pub fn ty(&self) -> &TypeKey {
        &self.shape.ty
    }

    pub fn format(&self) -> DataFormat {
        self.shape.format
    }

    pub fn map_key_format(&self) -> DataFormat {
        self.shape.map_key_format
    }

    pub fn is_required(&self) -> bool {
        self.shape.required
    }

    pub fn is_packed(&self) -> bool {
        self.shape.packed
    }

    pub fn as_reference(&self) -> bool {
        self.shape.as_reference
    }

    pub fn dynamic_type(&self) -> bool {
        self.shape.dynamic_type
    }

    /// Member-level override; `NotSpecified` defers to the descriptor.
    pub fn compatibility_level(&self) -> CompatibilityLevel {
        self.shape.compatibility
    }

    pub fn default_value(&self) -> Option<&str> {
        self.shape.default_value.as_deref()
    }
}

impl From<FieldShape> for ValueMember {
    fn from(shape: FieldShape) -> Self {
        Self { shape }
    }
}

/// A declared subtype, carried on the wire under `number`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubType {
    pub number: u32,
    pub ty: TypeKey,
}

/// Check `number` against the protobuf limits and the numbers already taken
/// by `members` and `subtypes`.
pub(crate) fn validate_number(
    owner: &TypeKey,
    number: u32,
    members: &[ValueMember],
    subtypes: &[SubType],
) -> Result<()> {
    let invalid = |reason: String| Error::InvalidMember {
        owner: owner.clone(),
        reason,
    };

    if !(MIN_FIELD_NUMBER..=MAX_FIELD_NUMBER).contains(&number) {
        return Err(invalid(format!(
            "field number {} is outside {}..={}",
            number, MIN_FIELD_NUMBER, MAX_FIELD_NUMBER
        )));
    }
    if (RESERVED_FIELD_START..=RESERVED_FIELD_END).contains(&number) {
        return Err(invalid(format!(
            "field number {} is in the reserved range {}..={}",
            number, RESERVED_FIELD_START, RESERVED_FIELD_END
        )));
    }
    if let Some(taken) = members.iter().find(|m| m.number() == number) {
        return Err(invalid(format!(
            "field number {} is already used by member '{}'",
            number,
            taken.name()
        )));
    }
    if let Some(taken) = subtypes.iter().find(|s| s.number == number) {
        return Err(invalid(format!(
            "field number {} is already used by subtype {}",
            number, taken.ty
        )));
    }
    Ok(())
}

/// Insert keeping members ordered by field number.
pub(crate) fn insert_sorted(members: &mut Vec<ValueMember>, member: ValueMember) {
    let at = members.partition_point(|m| m.number() < member.number());
    members.insert(at, member);
}
