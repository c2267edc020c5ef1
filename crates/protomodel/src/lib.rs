// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # protomodel - runtime-configurable protobuf type model
//!
//! Builds protobuf serializers for types that are only known at run time,
//! caches them, and exports the model as `.proto` text.
//!
//! ## Quick Start
//!
//! ```rust
//! use protomodel::{MessageShape, MessageValue, ShapeCatalog, TypeKey, TypeModel, TypeShape, Value};
//! use std::sync::Arc;
//!
//! let catalog = Arc::new(ShapeCatalog::new());
//! catalog.insert(
//!     "Demo.Point",
//!     TypeShape::Message(
//!         MessageShape::contract()
//!             .field(1, "x", "builtin.i32")
//!             .field(2, "y", "builtin.i32"),
//!     ),
//! );
//!
//! let model = TypeModel::new(catalog);
//! let point = TypeKey::new("Demo.Point");
//! let value = Value::Message(MessageValue::new("Demo.Point").with("x", 3).with("y", 4));
//!
//! let bytes = model.serialize(&point, &value)?;
//! assert_eq!(bytes, [0x08, 0x03, 0x10, 0x04]);
//! assert_eq!(model.deserialize(&point, &bytes)?, value);
//! # Ok::<(), protomodel::Error>(())
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |  TypeModel (handle)                                                 |
//! |    registry: arena of MetaType, lock-free reads, appends under lock |
//! |    caches:   basic scalars | per type | per member format          |
//! |    lock:     one reentrant metadata lock + contention telemetry     |
//! +---------------------------------------------------------------------+
//! |  TypeIntrospector (ShapeCatalog or your own)  ->  TypeShape          |
//! +---------------------------------------------------------------------+
//! |  Serializer implementations  ->  wire (varint, tags, nesting)       |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`model`] - the model, its lock and the default model slot (start here)
//! - [`meta`] - type descriptors and members
//! - [`introspect`] - where type shapes come from
//! - [`serializer`] - the serializer capability
//! - [`schema`] - `.proto` export
//! - [`config`] - constants and [`ModelOptions`]

/// Constants and model options (defaults, environment, YAML).
pub mod config;
/// Error type shared by all operations.
pub mod error;
/// Type shapes and the introspection collaborator.
pub mod introspect;
/// Type descriptors.
pub mod meta;
/// The type model.
pub mod model;
/// `.proto` schema export.
pub mod schema;
/// Serializer capability and implementations.
pub mod serializer;
/// Runtime type identity and encoding hints.
pub mod types;
/// Dynamic values.
pub mod value;
/// Protobuf wire primitives.
pub mod wire;

pub use config::ModelOptions;
pub use error::{Error, Result};
pub use introspect::{
    ContractFamily, EnumShape, EnumVariant, FieldShape, MessageShape, ShapeCatalog,
    TypeIntrospector, TypeShape,
};
pub use meta::{CollectionProvider, MetaKind, MetaType, SubType, ValueMember};
pub use model::{
    ClosureListener, DefaultFactory, FindOptions, LockContention, LockContentionListener,
    TypeModel, TypeModelBuilder,
};
pub use schema::SchemaOptions;
pub use serializer::{Serializer, SerializerFeatures};
pub use types::{CompatibilityLevel, DataFormat, ProtoSyntax, ScalarKind, TypeKey};
pub use value::{MessageValue, Value};

/// Crate version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
