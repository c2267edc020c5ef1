// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message serializer.
//!
//! Inheritance uses the nested-subtype layout: the root of a chain is the
//! outer message, and each subtype level travels as a nested message under
//! its declared subtype field number, written before the level's own members.
//!
//! ```text
//! Animal { 10: Dog { 1: breed }, 1: name }
//! ```

use super::{read_element, upgrade, write_element, Serializer, SerializerFeatures};
use crate::error::{Error, Result};
use crate::meta::{SubType, ValueMember};
use crate::model::ModelCore;
use crate::types::{CompatibilityLevel, TypeKey};
use crate::value::{MessageValue, Value};
use crate::wire::{WireReader, WireType, WireWriter};
use std::sync::Weak;

/// Snapshot of a descriptor's members; rebuilt whenever the descriptor
/// changes (the model drops the cached instance).
#[derive(Debug)]
pub(crate) struct MessageSerializer {
    key: TypeKey,
    base: Option<TypeKey>,
    members: Vec<ValueMember>,
    subtypes: Vec<SubType>,
    level: CompatibilityLevel,
    has_factory: bool,
    model: Weak<ModelCore>,
}

impl MessageSerializer {
    pub(crate) fn new(
        key: TypeKey,
        base: Option<TypeKey>,
        members: Vec<ValueMember>,
        subtypes: Vec<SubType>,
        level: CompatibilityLevel,
        has_factory: bool,
        model: Weak<ModelCore>,
    ) -> Self {
        Self {
            key,
            base,
            members,
            subtypes,
            level,
            has_factory,
            model,
        }
    }

    fn message<'v>(&self, value: &'v Value) -> Result<&'v MessageValue> {
        value
            .as_message()
            .ok_or_else(|| Error::mismatch(format!("message {}", self.key), value))
    }

    fn into_message(&self, core: &ModelCore, existing: Option<Value>) -> MessageValue {
        match existing {
            Some(Value::Message(msg)) => msg,
            _ => core.create_instance(&self.key),
        }
    }

    /// Subtype entry leading from this level towards `concrete`.
    fn subtype_towards(&self, core: &ModelCore, concrete: &TypeKey) -> Option<&SubType> {
        if *concrete == self.key {
            return None;
        }
        self.subtypes
            .iter()
            .find(|sub| core.is_assignable(&sub.ty, concrete))
    }

    /// This level and everything below it.
    fn write_level(&self, msg: &MessageValue, out: &mut WireWriter) -> Result<()> {
        let core = upgrade(&self.model)?;

        if let Some(sub) = self.subtype_towards(&core, &msg.type_key) {
            let derived = core.resolve(&sub.ty, self.level)?;
            out.write_tag(sub.number, WireType::LengthDelimited);
            out.write_nested(|w| derived.write_subtype(msg, w))?;
        }

        let implicit_zero = core.options().implicit_zero_default;
        for member in &self.members {
            let Some(value) = msg.get(member.name()) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let serializer = core.member_serializer(member, self.level)?;
            let zero_skippable = serializer
                .features()
                .contains(SerializerFeatures::SCALAR | SerializerFeatures::ENUM);
            if implicit_zero && zero_skippable && !member.is_required() && value.is_implicit_zero()
            {
                continue;
            }
            write_element(&*serializer, member.number(), member.format(), value, out)?;
        }
        Ok(())
    }

    /// Merge fields until the input (or the enclosing group) ends.
    fn read_level(
        &self,
        input: &mut WireReader<'_>,
        target: &mut MessageValue,
        group: Option<u32>,
    ) -> Result<()> {
        let core = upgrade(&self.model)?;
        while !input.is_empty() {
            let (field, wire_type) = input.read_tag()?;
            if wire_type == WireType::EndGroup {
                return match group {
                    Some(open) if open == field => Ok(()),
                    _ => Err(crate::wire::WireError::UnbalancedGroup(field).into()),
                };
            }

            if let Some(sub) = self.subtypes.iter().find(|s| s.number == field) {
                let derived = core.resolve(&sub.ty, self.level)?;
                super::expect_wire(WireType::LengthDelimited, wire_type)?;
                let mut nested = input.read_nested()?;
                derived.merge_subtype(&mut nested, target)?;
            } else if let Some(member) = self.members.iter().find(|m| m.number() == field) {
                let serializer = core.member_serializer(member, self.level)?;
                let existing = target.fields.remove(member.name());
                let value = read_element(&*serializer, field, wire_type, input, existing)?;
                target.fields.insert(member.name().to_string(), value);
            } else {
                input.skip(field, wire_type)?;
            }
        }
        match group {
            Some(open) => Err(crate::wire::WireError::UnbalancedGroup(open).into()),
            None => Ok(()),
        }
    }
}

impl Serializer for MessageSerializer {
    fn type_key(&self) -> &TypeKey {
        &self.key
    }

    fn features(&self) -> SerializerFeatures {
        let mut features = SerializerFeatures::MESSAGE;
        if self.base.is_some() || !self.subtypes.is_empty() {
            features = features | SerializerFeatures::INHERITANCE;
        }
        if self.has_factory {
            features = features | SerializerFeatures::FACTORY;
        }
        features
    }

    fn wire_type(&self) -> WireType {
        WireType::LengthDelimited
    }

    fn default_value(&self) -> Value {
        match self.model.upgrade() {
            Some(core) => Value::Message(core.create_instance(&self.key)),
            None => Value::Message(MessageValue::new(self.key.clone())),
        }
    }

    fn write_payload(&self, value: &Value, out: &mut WireWriter) -> Result<()> {
        out.write_nested(|w| self.write(value, w))
    }

    fn read_payload(&self, input: &mut WireReader<'_>, existing: Option<Value>) -> Result<Value> {
        let mut body = input.read_nested()?;
        self.read(&mut body, existing)
    }

    /// Message body. Derived types are written from the root of their chain.
    fn write(&self, value: &Value, out: &mut WireWriter) -> Result<()> {
        let msg = self.message(value)?;
        if self.base.is_some() {
            let core = upgrade(&self.model)?;
            let root = core.root_of(&self.key);
            if root != self.key {
                return core.resolve(&root, self.level)?.write(value, out);
            }
        }
        self.write_level(msg, out)
    }

    fn read(&self, input: &mut WireReader<'_>, existing: Option<Value>) -> Result<Value> {
        let core = upgrade(&self.model)?;
        let mut target = self.into_message(&core, existing);
        if self.base.is_some() {
            let root = core.root_of(&self.key);
            if root != self.key {
                return core
                    .resolve(&root, self.level)?
                    .read(input, Some(Value::Message(target)));
            }
        }
        self.read_level(input, &mut target, None)?;
        Ok(Value::Message(target))
    }

    fn write_group(&self, field: u32, value: &Value, out: &mut WireWriter) -> Result<()> {
        out.write_tag(field, WireType::StartGroup);
        self.write(value, out)?;
        out.write_tag(field, WireType::EndGroup);
        Ok(())
    }

    fn read_group(
        &self,
        field: u32,
        input: &mut WireReader<'_>,
        existing: Option<Value>,
    ) -> Result<Value> {
        let core = upgrade(&self.model)?;
        let mut target = self.into_message(&core, existing);
        input.enter_group()?;
        self.read_level(input, &mut target, Some(field))?;
        input.leave_group();
        Ok(Value::Message(target))
    }

    fn write_subtype(&self, value: &MessageValue, out: &mut WireWriter) -> Result<()> {
        self.write_level(value, out)
    }

    fn merge_subtype(&self, input: &mut WireReader<'_>, target: &mut MessageValue) -> Result<()> {
        let core = upgrade(&self.model)?;
        if !core.is_assignable(&self.key, &target.type_key) {
            target.type_key = self.key.clone();
        }
        self.read_level(input, target, None)
    }
}
