// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serializers that delegate to another one.

use super::{upgrade, Serializer, SerializerFeatures};
use crate::error::Result;
use crate::model::ModelCore;
use crate::types::{CompatibilityLevel, TypeKey};
use crate::value::{MessageValue, Value};
use crate::wire::{WireReader, WireType, WireWriter};
use std::sync::{Arc, Weak};

/// Values of `key` travel as values of `surrogate`.
///
/// Message values are relabelled on the way in and out; converting field
/// contents between the two types is the application's business.
#[derive(Debug)]
pub(crate) struct SurrogateSerializer {
    key: TypeKey,
    surrogate: TypeKey,
    level: CompatibilityLevel,
    model: Weak<ModelCore>,
}

impl SurrogateSerializer {
    pub(crate) fn new(
        key: TypeKey,
        surrogate: TypeKey,
        level: CompatibilityLevel,
        model: Weak<ModelCore>,
    ) -> Self {
        Self {
            key,
            surrogate,
            level,
            model,
        }
    }

    fn inner(&self) -> Result<Arc<dyn Serializer>> {
        upgrade(&self.model)?.resolve(&self.surrogate, self.level)
    }

    fn relabel(value: &Value, from: &TypeKey, to: &TypeKey) -> Value {
        match value {
            Value::Message(msg) if msg.type_key == *from => Value::Message(MessageValue {
                type_key: to.clone(),
                fields: msg.fields.clone(),
            }),
            other => other.clone(),
        }
    }

    fn outgoing(&self, value: &Value) -> Value {
        Self::relabel(value, &self.key, &self.surrogate)
    }

    fn incoming(&self, value: Value) -> Value {
        Self::relabel(&value, &self.surrogate, &self.key)
    }

    fn incoming_existing(&self, existing: Option<Value>) -> Option<Value> {
        existing.map(|v| self.outgoing(&v))
    }
}

impl Serializer for SurrogateSerializer {
    fn type_key(&self) -> &TypeKey {
        &self.key
    }

    fn features(&self) -> SerializerFeatures {
        let inner = self
            .inner()
            .map_or(SerializerFeatures::empty(), |s| s.features());
        inner | SerializerFeatures::SURROGATE
    }

    fn wire_type(&self) -> WireType {
        self.inner()
            .map_or(WireType::LengthDelimited, |s| s.wire_type())
    }

    fn default_value(&self) -> Value {
        match self.inner() {
            Ok(inner) => self.incoming(inner.default_value()),
            Err(_) => Value::Message(MessageValue::new(self.key.clone())),
        }
    }

    fn write_payload(&self, value: &Value, out: &mut WireWriter) -> Result<()> {
        self.inner()?.write_payload(&self.outgoing(value), out)
    }

    fn read_payload(&self, input: &mut WireReader<'_>, existing: Option<Value>) -> Result<Value> {
        let value = self
            .inner()?
            .read_payload(input, self.incoming_existing(existing))?;
        Ok(self.incoming(value))
    }

    fn write_field(&self, field: u32, value: &Value, out: &mut WireWriter) -> Result<()> {
        self.inner()?.write_field(field, &self.outgoing(value), out)
    }

    fn read_field(
        &self,
        field: u32,
        wire_type: WireType,
        input: &mut WireReader<'_>,
        existing: Option<Value>,
    ) -> Result<Value> {
        let value =
            self.inner()?
                .read_field(field, wire_type, input, self.incoming_existing(existing))?;
        Ok(self.incoming(value))
    }

    fn write(&self, value: &Value, out: &mut WireWriter) -> Result<()> {
        self.inner()?.write(&self.outgoing(value), out)
    }

    fn read(&self, input: &mut WireReader<'_>, existing: Option<Value>) -> Result<Value> {
        let value = self.inner()?.read(input, self.incoming_existing(existing))?;
        Ok(self.incoming(value))
    }

    fn write_group(&self, field: u32, value: &Value, out: &mut WireWriter) -> Result<()> {
        self.inner()?.write_group(field, &self.outgoing(value), out)
    }

    fn read_group(
        &self,
        field: u32,
        input: &mut WireReader<'_>,
        existing: Option<Value>,
    ) -> Result<Value> {
        let value = self
            .inner()?
            .read_group(field, input, self.incoming_existing(existing))?;
        Ok(self.incoming(value))
    }
}

/// Descriptor-level wrapper around a serializer supplied from outside.
///
/// Resolution hands out the wrapped serializer itself.
#[derive(Debug)]
pub(crate) struct ExternalHandle {
    inner: Arc<dyn Serializer>,
}

impl ExternalHandle {
    pub(crate) fn new(inner: Arc<dyn Serializer>) -> Self {
        Self { inner }
    }
}

impl Serializer for ExternalHandle {
    fn type_key(&self) -> &TypeKey {
        self.inner.type_key()
    }

    fn features(&self) -> SerializerFeatures {
        self.inner.features() | SerializerFeatures::EXTERNAL
    }

    fn wire_type(&self) -> WireType {
        self.inner.wire_type()
    }

    fn default_value(&self) -> Value {
        self.inner.default_value()
    }

    fn write_payload(&self, value: &Value, out: &mut WireWriter) -> Result<()> {
        self.inner.write_payload(value, out)
    }

    fn read_payload(&self, input: &mut WireReader<'_>, existing: Option<Value>) -> Result<Value> {
        self.inner.read_payload(input, existing)
    }

    fn write(&self, value: &Value, out: &mut WireWriter) -> Result<()> {
        self.inner.write(value, out)
    }

    fn read(&self, input: &mut WireReader<'_>, existing: Option<Value>) -> Result<Value> {
        self.inner.read(input, existing)
    }

    fn external(&self) -> Option<Arc<dyn Serializer>> {
        Some(Arc::clone(&self.inner))
    }
}
