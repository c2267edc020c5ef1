// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! How a type behaves as a repeated field or map.

use crate::types::{ScalarKind, TypeKey};

/// Repeated-field behaviour of a collection or map type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionProvider {
    Repeated {
        item: TypeKey,
    },
    Map {
        key: TypeKey,
        value: TypeKey,
        /// The value type is itself repeated, which a native map cannot hold.
        value_is_repeated: bool,
    },
}

impl CollectionProvider {
    pub fn repeated(item: TypeKey) -> Self {
        Self::Repeated { item }
    }

    pub fn map(key: TypeKey, value: TypeKey, value_is_repeated: bool) -> Self {
        Self::Map {
            key,
            value,
            value_is_repeated,
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map { .. })
    }

    /// Element type of the repeated field: the item, or the key/value pair
    /// type for maps.
    pub fn item_type(&self) -> TypeKey {
        match self {
            Self::Repeated { item } => item.clone(),
            Self::Map { key, value, .. } => TypeKey::map_entry(key, value),
        }
    }

    pub fn key_type(&self) -> Option<&TypeKey> {
        match self {
            Self::Map { key, .. } => Some(key),
            Self::Repeated { .. } => None,
        }
    }

    pub fn value_type(&self) -> Option<&TypeKey> {
        match self {
            Self::Map { value, .. } => Some(value),
            Self::Repeated { .. } => None,
        }
    }

    /// Synthetic pair type used when the map is not a valid protobuf map.
    pub fn pair_type(&self) -> Option<TypeKey> {
        match self {
            Self::Map { key, value, .. } => Some(TypeKey::map_entry(key, value)),
            Self::Repeated { .. } => None,
        }
    }

    /// Whether entries can use the native `map<K, V>` encoding: integral,
    /// bool or string key and a value that is not itself repeated.
    pub fn is_valid_map(&self) -> bool {
        match self {
            Self::Map {
                key,
                value_is_repeated,
                ..
            } => {
                !value_is_repeated
                    && ScalarKind::from_key(key).is_some_and(ScalarKind::is_valid_map_key)
            }
            Self::Repeated { .. } => false,
        }
    }
}
