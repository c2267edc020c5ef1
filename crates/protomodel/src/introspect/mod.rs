// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type introspection collaborator.
//!
//! The model never inspects application types itself. It asks a
//! [`TypeIntrospector`] for each type's [`TypeShape`] and treats the answer as
//! already resolved (field order, naming and contract markers are the
//! introspector's business).

mod catalog;
mod shape;

pub use catalog::ShapeCatalog;
pub use shape::{
    ContractFamily, EnumShape, EnumVariant, FieldShape, MessageShape, TypeShape,
};

use crate::types::TypeKey;

/// Source of type shapes.
///
/// Built-in scalars are recognised by the model from their [`TypeKey`] and are
/// never asked for.
pub trait TypeIntrospector: Send + Sync {
    /// Shape of `key`, or `None` when the type is unknown.
    fn shape(&self, key: &TypeKey) -> Option<TypeShape>;
}
