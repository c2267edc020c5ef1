// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime type identity.

use std::fmt;
use std::sync::Arc;

/// Namespaces treated as platform types: never used for package inference.
const SYSTEM_NAMESPACES: &[&str] = &["builtin", "std", "core", "alloc"];

/// Runtime identity of an application type.
///
/// A key is a dotted, fully-qualified name (`Demo.Orders.Point`). Generic
/// instantiations keep their arguments inside angle brackets
/// (`Demo.Pair<Demo.A,Demo.B>`); only the part before `<` takes part in
/// namespace and short-name extraction.
///
/// Cloning is a reference-count bump.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey(Arc<str>);

impl TypeKey {
    /// Create a key from a fully-qualified name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Key for a Rust type, using its `type_name` with `::` mapped to `.`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(std::any::type_name::<T>().replace("::", "."))
    }

    /// Synthetic key of the key/value pair message used when a map cannot be
    /// encoded as a native protobuf map.
    pub fn map_entry(key: &TypeKey, value: &TypeKey) -> Self {
        Self::new(format!("builtin.KeyValuePair<{},{}>", key, value))
    }

    /// Full name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Name without generic arguments.
    fn head(&self) -> &str {
        match self.0.split_once('<') {
            Some((head, _)) => head,
            None => &self.0,
        }
    }

    /// Namespace (everything before the last `.` of the non-generic head).
    pub fn namespace(&self) -> Option<&str> {
        self.head().rsplit_once('.').map(|(ns, _)| ns)
    }

    /// Last segment of the non-generic head.
    pub fn short_name(&self) -> &str {
        let head = self.head();
        head.rsplit_once('.').map_or(head, |(_, name)| name)
    }

    /// Whether the key is generic (`Name<...>`).
    pub fn is_generic(&self) -> bool {
        self.0.contains('<')
    }

    /// Whether the type lives in a platform namespace.
    pub fn is_system(&self) -> bool {
        match self.namespace() {
            Some(ns) => SYSTEM_NAMESPACES
                .iter()
                .any(|sys| ns == *sys || ns.starts_with(&format!("{}.", sys))),
            None => false,
        }
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.0)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeKey {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TypeKey {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}
