// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-memory introspector.

use super::{TypeIntrospector, TypeShape};
use crate::types::TypeKey;
use dashmap::DashMap;

/// Concurrent table of declared shapes.
///
/// Suitable for tests and for applications that describe their types at
/// runtime (schemas loaded from configuration, plugin types, ...).
///
/// # Example
///
/// ```rust
/// use protomodel::{MessageShape, ShapeCatalog, TypeShape};
///
/// let catalog = ShapeCatalog::new();
/// catalog.insert(
///     "Demo.Point",
///     TypeShape::Message(MessageShape::contract().field(1, "x", "builtin.i32")),
/// );
/// assert_eq!(catalog.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ShapeCatalog {
    shapes: DashMap<TypeKey, TypeShape>,
}

impl ShapeCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or replace) the shape of a type.
    pub fn insert(&self, key: impl Into<TypeKey>, shape: TypeShape) {
        self.shapes.insert(key.into(), shape);
    }

    pub fn remove(&self, key: &TypeKey) -> Option<TypeShape> {
        self.shapes.remove(key).map(|(_, shape)| shape)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl TypeIntrospector for ShapeCatalog {
    fn shape(&self, key: &TypeKey) -> Option<TypeShape> {
        self.shapes.get(key).map(|entry| entry.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::introspect::EnumShape;

    #[test]
    fn test_insert_and_lookup() {
        let catalog = ShapeCatalog::new();
        assert!(catalog.is_empty());

        catalog.insert("Demo.Color", TypeShape::Enum(EnumShape::new().variant("Red", 0)));
        let shape = catalog.shape(&TypeKey::new("Demo.Color"));
        assert!(matches!(shape, Some(TypeShape::Enum(_))));
        assert!(catalog.shape(&TypeKey::new("Demo.Missing")).is_none());

        assert!(catalog.remove(&TypeKey::new("Demo.Color")).is_some());
        assert!(catalog.is_empty());
    }
}
