// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error type shared by every model operation.

use crate::types::TypeKey;
use crate::wire::WireError;
use std::time::Duration;

/// Errors returned by model registration, resolution and schema export.
///
/// None of these are retried internally: each one is a definite condition
/// (bad configuration, a genuine deadlock, or an unsupported type) that the
/// caller has to act on.
///
/// # Example
///
/// ```rust
/// use protomodel::{Error, ShapeCatalog, TypeKey, TypeModel};
/// use std::sync::Arc;
///
/// let model = TypeModel::new(Arc::new(ShapeCatalog::new()));
/// match model.add(&TypeKey::new("builtin.i32"), true) {
///     Err(Error::InbuiltType(key)) => println!("{} needs no descriptor", key),
///     other => panic!("unexpected: {:?}", other.map(|m| m.index())),
/// }
/// ```
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Registration Errors
    // ========================================================================
    /// A descriptor was demanded for a type that only ever has built-in handling.
    InbuiltType(TypeKey),
    /// The type is not known and the model refuses to add it automatically.
    UnexpectedType(TypeKey),
    /// Explicit add of a type that another caller registered first.
    DuplicateType(TypeKey),
    /// A field or subtype number is out of range or already taken.
    InvalidMember { owner: TypeKey, reason: String },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Mutation on a frozen model, or an invariant violation on the default model.
    InvalidOperation(String),
    /// The metadata lock was not acquired within the configured window.
    Timeout(Duration),
    /// A serializer outlived the model that produced it.
    ModelDropped,

    // ========================================================================
    // Serialization Errors
    // ========================================================================
    /// No serializer can be produced for the type.
    NoSerializerAvailable(TypeKey),
    /// A value does not fit the serializer it was handed to.
    ValueMismatch { expected: String, found: String },
    /// Malformed or truncated wire data.
    Wire(WireError),

    // ========================================================================
    // Schema Errors
    // ========================================================================
    /// The type has no protobuf mapping.
    NotSupported(String),
}

impl Error {
    pub(crate) fn frozen() -> Self {
        Error::InvalidOperation("the model cannot be changed once frozen".to_string())
    }

    pub(crate) fn mismatch(expected: impl Into<String>, found: &crate::value::Value) -> Self {
        Error::ValueMismatch {
            expected: expected.into(),
            found: found.kind_name().to_string(),
        }
    }
}

impl std::fmt::Display for Error {
    // @audit-ok: Simple pattern matching - error message dispatch table
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InbuiltType(key) => write!(
                f,
                "Data of type {} has inbuilt behaviour and cannot be added to a model",
                key
            ),
            Error::UnexpectedType(key) => write!(
                f,
                "Type is not expected, and no contract can be inferred: {}",
                key
            ),
            Error::DuplicateType(key) => write!(f, "Duplicate entry for type {}", key),
            Error::InvalidMember { owner, reason } => {
                write!(f, "Invalid member on {}: {}", owner, reason)
            }
            Error::InvalidOperation(msg) => write!(f, "Invalid operation: {}", msg),
            Error::Timeout(waited) => write!(
                f,
                "Timeout after {}ms while inspecting metadata; this may indicate a deadlock. \
                 This can often be avoided by preparing necessary serializers during application \
                 initialization, rather than allowing multiple threads to perform the initial \
                 metadata inspection; see also the lock contention listener",
                waited.as_millis()
            ),
            Error::ModelDropped => write!(f, "The owning type model has been dropped"),
            Error::NoSerializerAvailable(key) => {
                write!(f, "No serializer available for type {}", key)
            }
            Error::ValueMismatch { expected, found } => {
                write!(f, "Value mismatch: expected {}, found {}", expected, found)
            }
            Error::Wire(e) => write!(f, "Wire error: {}", e),
            Error::NotSupported(msg) => write!(f, "Not supported: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Wire(e) => Some(e),
            _ => None,
        }
    }
}

impl From<WireError> for Error {
    fn from(e: WireError) -> Self {
        Error::Wire(e)
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;
