// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dynamic values handed to and produced by serializers.

use crate::types::TypeKey;
use std::collections::BTreeMap;

/// A value of any modelled type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    // Scalars
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Vec<u8>),
    Timestamp { seconds: i64, nanos: i32 },
    Duration { seconds: i64, nanos: i32 },
    Enum(i64),

    // Composites
    List(Vec<Value>),
    Map(Vec<(Value, Value)>),
    Message(MessageValue),

    // Special
    Null,
}

impl Value {
    /// Short name of the variant, used in mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Timestamp { .. } => "timestamp",
            Self::Duration { .. } => "duration",
            Self::Enum(_) => "enum",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Message(_) => "message",
            Self::Null => "null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether the value equals its type's implicit zero default.
    pub fn is_implicit_zero(&self) -> bool {
        match self {
            Self::Bool(v) => !*v,
            Self::I32(v) => *v == 0,
            Self::I64(v) => *v == 0,
            Self::U32(v) => *v == 0,
            Self::U64(v) => *v == 0,
            Self::F32(v) => *v == 0.0,
            Self::F64(v) => *v == 0.0,
            Self::String(v) => v.is_empty(),
            Self::Bytes(v) => v.is_empty(),
            Self::Timestamp { seconds, nanos } | Self::Duration { seconds, nanos } => {
                *seconds == 0 && *nanos == 0
            }
            Self::Enum(v) => *v == 0,
            Self::List(_) | Self::Map(_) | Self::Message(_) | Self::Null => false,
        }
    }

    pub fn as_message(&self) -> Option<&MessageValue> {
        match self {
            Self::Message(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::I32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::U32(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::U64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<MessageValue> for Value {
    fn from(v: MessageValue) -> Self {
        Self::Message(v)
    }
}

/// An instance of a message type.
///
/// `type_key` names the concrete (most derived) type. Fields of every level of
/// an inheritance chain live in the same map, keyed by member name.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageValue {
    pub type_key: TypeKey,
    pub fields: BTreeMap<String, Value>,
}

impl MessageValue {
    pub fn new(type_key: impl Into<TypeKey>) -> Self {
        Self {
            type_key: type_key.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Protobuf merge: scalars overwrite, lists append, nested messages merge.
    pub fn merge_field(&mut self, name: &str, incoming: Value) {
        let Some(slot) = self.fields.get_mut(name) else {
            self.fields.insert(name.to_string(), incoming);
            return;
        };
        match (slot, incoming) {
            (Value::List(existing), Value::List(more)) => existing.extend(more),
            (Value::Map(existing), Value::Map(more)) => existing.extend(more),
            (Value::Message(existing), Value::Message(more)) => {
                existing.type_key = more.type_key;
                for (field, value) in more.fields {
                    existing.merge_field(&field, value);
                }
            }
            (slot, incoming) => *slot = incoming,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_implicit_zero() {
        assert!(Value::I32(0).is_implicit_zero());
        assert!(Value::String(String::new()).is_implicit_zero());
        assert!(!Value::I32(3).is_implicit_zero());
        assert!(!Value::List(Vec::new()).is_implicit_zero());
        assert!(!Value::Null.is_implicit_zero());
    }

    #[test]
    fn test_merge_semantics() {
        let mut msg = MessageValue::new("Demo.Bag")
            .with("count", 1)
            .with("items", Value::List(vec![Value::I32(1)]));

        msg.merge_field("count", Value::I32(2));
        msg.merge_field("items", Value::List(vec![Value::I32(2)]));

        assert_eq!(msg.get("count"), Some(&Value::I32(2)));
        assert_eq!(
            msg.get("items"),
            Some(&Value::List(vec![Value::I32(1), Value::I32(2)]))
        );
    }

    #[test]
    fn test_merge_nested_message() {
        let inner = MessageValue::new("Demo.Inner").with("a", 1);
        let mut outer = MessageValue::new("Demo.Outer").with("inner", inner);

        let patch = MessageValue::new("Demo.Inner").with("b", 2);
        outer.merge_field("inner", Value::Message(patch));

        let merged = outer.get("inner").and_then(Value::as_message).expect("inner");
        assert_eq!(merged.get("a"), Some(&Value::I32(1)));
        assert_eq!(merged.get("b"), Some(&Value::I32(2)));
    }
}
