// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The runtime type model.
//!
//! A [`TypeModel`] owns a registry of descriptors, the serializer caches and
//! one coarse metadata lock. It is a cheap handle: clones share the same
//! model.
//!
//! # Locks
//!
//! ```text
//! serializer cache lock -> metadata lock      (resolution may register)
//! default slot lock     -> metadata lock      (make_default)
//! ```
//!
//! Nothing takes a cache lock while holding the metadata lock.

mod builder;
mod cascade;
mod default_model;
mod lock;
mod registry;
mod resolve;

pub use builder::TypeModelBuilder;
pub use lock::{ClosureListener, LockContention, LockContentionListener};

pub(crate) use cascade::Cascade;
pub(crate) use lock::ModelLockGuard;

use crate::config::ModelOptions;
use crate::error::{Error, Result};
use crate::introspect::{MessageShape, ShapeCatalog, TypeIntrospector, TypeShape};
use crate::meta::{CollectionProvider, MetaKind, MetaType};
use crate::schema::SchemaOptions;
use crate::serializer::Serializer;
use crate::types::{CompatibilityLevel, DataFormat, ProtoSyntax, ScalarKind, TypeKey};
use crate::value::{MessageValue, Value};
use crate::wire::{WireReader, WireWriter};
use dashmap::DashMap;
use lock::ModelLock;
use parking_lot::{Mutex, ReentrantMutex, RwLock, RwLockReadGuard};
use registry::Registry;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Longest `Nullable` chain followed before giving up.
const MAX_WRAPPER_DEPTH: usize = 8;

/// How [`TypeModel::find_or_add`] treats a type it does not know yet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FindOptions {
    /// Fail instead of returning `None`.
    pub demand: bool,
    /// Only auto-add types that declare a contract.
    pub contract_only: bool,
    /// Add the type even when it does not qualify.
    pub force_add: bool,
    /// Level inherited by a descriptor created for this lookup.
    pub ambient: CompatibilityLevel,
}

impl FindOptions {
    /// Non-demanding lookup that may auto-add.
    pub fn lookup() -> Self {
        Self::default()
    }

    /// Demanding lookup.
    pub fn demand() -> Self {
        Self {
            demand: true,
            ..Self::default()
        }
    }

    pub fn force(mut self) -> Self {
        self.force_add = true;
        self
    }

    pub fn contract_only(mut self) -> Self {
        self.contract_only = true;
        self
    }

    pub fn ambient(mut self, level: CompatibilityLevel) -> Self {
        self.ambient = level;
        self
    }
}

/// Produces instances for message types (e.g. prefilled defaults).
pub type DefaultFactory = Arc<dyn Fn(&TypeKey) -> Option<MessageValue> + Send + Sync>;

/// Field cache key: type, format, packed, map key format, effective level.
pub(crate) type FieldKey = (TypeKey, DataFormat, bool, DataFormat, CompatibilityLevel);

type BasicKey = (ScalarKind, DataFormat, CompatibilityLevel);

/// Shared state behind every [`TypeModel`] handle.
pub(crate) struct ModelCore {
    pub(crate) weak_self: Weak<ModelCore>,
    introspector: Arc<dyn TypeIntrospector>,
    catalog: Option<Arc<ShapeCatalog>>,
    /// Shapes the model makes up itself (map entry pairs).
    synthetic: DashMap<TypeKey, TypeShape>,
    pub(crate) registry: Registry,
    lock: ModelLock,
    options: RwLock<ModelOptions>,
    frozen: AtomicBool,
    pub(crate) is_default: AtomicBool,
    pub(crate) basic: DashMap<BasicKey, Arc<dyn Serializer>>,
    pub(crate) basic_lock: Mutex<()>,
    pub(crate) serializers: DashMap<TypeKey, Arc<dyn Serializer>>,
    pub(crate) fields: DashMap<FieldKey, Arc<dyn Serializer>>,
    pub(crate) cache_lock: ReentrantMutex<()>,
    pub(crate) default_factory: RwLock<Option<DefaultFactory>>,
}

impl fmt::Debug for ModelCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelCore")
            .field("types", &self.registry.len())
            .field("serializers", &self.serializers.len())
            .field("frozen", &self.is_frozen())
            .field("is_default", &self.is_default.load(Ordering::Relaxed))
            .field("lock", &self.lock)
            .finish()
    }
}

impl ModelCore {
    pub(crate) fn new(
        introspector: Arc<dyn TypeIntrospector>,
        catalog: Option<Arc<ShapeCatalog>>,
        options: ModelOptions,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            introspector,
            catalog,
            synthetic: DashMap::new(),
            registry: Registry::new(),
            lock: ModelLock::new(),
            options: RwLock::new(options),
            frozen: AtomicBool::new(false),
            is_default: AtomicBool::new(false),
            basic: DashMap::new(),
            basic_lock: Mutex::new(()),
            serializers: DashMap::new(),
            fields: DashMap::new(),
            cache_lock: ReentrantMutex::new(()),
            default_factory: RwLock::new(None),
        })
    }

    pub(crate) fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    pub(crate) fn options(&self) -> RwLockReadGuard<'_, ModelOptions> {
        self.options.read()
    }

    /// Acquire the metadata lock within the configured timeout.
    pub(crate) fn take_lock(&self) -> Result<ModelLockGuard<'_>> {
        let timeout = self.options().metadata_timeout;
        self.lock.take(timeout)
    }

    // ------------------------------------------------------------------
    // Shapes
    // ------------------------------------------------------------------

    pub(crate) fn shape_of(&self, key: &TypeKey) -> Option<TypeShape> {
        if ScalarKind::from_key(key).is_some() {
            return None;
        }
        if let Some(shape) = self.synthetic.get(key) {
            return Some(shape.value().clone());
        }
        self.introspector.shape(key)
    }

    /// `key` with `Nullable` wrappers removed.
    pub(crate) fn effective_key(&self, key: &TypeKey) -> TypeKey {
        let mut current = key.clone();
        for _ in 0..MAX_WRAPPER_DEPTH {
            match self.shape_of(&current) {
                Some(TypeShape::Nullable(inner)) => current = inner,
                _ => break,
            }
        }
        current
    }

    /// Repeated-field behaviour of `key`, if it is a collection or map.
    pub(crate) fn collection_provider(&self, key: &TypeKey) -> Option<CollectionProvider> {
        match self.shape_of(key) {
            Some(TypeShape::Collection(item)) => return Some(CollectionProvider::repeated(item)),
            Some(TypeShape::Map(k, v)) => return Some(self.map_provider(k, v)),
            Some(TypeShape::Message(m)) if !m.ignore_collection_handling => {
                if let Some(item) = m.collection_item {
                    return Some(CollectionProvider::repeated(item));
                }
            }
            _ => {}
        }
        self.registry
            .get(key)
            .filter(|meta| meta.kind() == MetaKind::Collection)
            .and_then(|meta| meta.collection())
    }

    /// Map provider; registers the pair shape when entries cannot use a
    /// native map.
    pub(crate) fn map_provider(&self, key: TypeKey, value: TypeKey) -> CollectionProvider {
        let value_is_repeated = self.is_collection(&self.effective_key(&value));
        let provider = CollectionProvider::map(key, value, value_is_repeated);
        if !provider.is_valid_map() {
            if let CollectionProvider::Map { key, value, .. } = &provider {
                self.ensure_pair_shape(key, value);
            }
        }
        provider
    }

    /// Collection check that does not recurse into map values.
    fn is_collection(&self, key: &TypeKey) -> bool {
        match self.shape_of(key) {
            Some(TypeShape::Collection(_) | TypeShape::Map(..)) => true,
            Some(TypeShape::Message(m)) => {
                m.collection_item.is_some() && !m.ignore_collection_handling
            }
            _ => false,
        }
    }

    /// Key of the synthetic `{ key = 1; value = 2; }` pair message.
    pub(crate) fn ensure_pair_shape(&self, key: &TypeKey, value: &TypeKey) -> TypeKey {
        let pair = TypeKey::map_entry(key, value);
        self.synthetic.entry(pair.clone()).or_insert_with(|| {
            TypeShape::Message(
                MessageShape::auto_tuple()
                    .named("KeyValuePair")
                    .field(1, "key", key.clone())
                    .field(2, "value", value.clone())
                    .generic_arg(key.clone())
                    .generic_arg(value.clone()),
            )
        });
        pair
    }

    // ------------------------------------------------------------------
    // Inheritance
    // ------------------------------------------------------------------

    fn base_of(&self, key: &TypeKey) -> Option<TypeKey> {
        self.registry.get(key).and_then(|meta| meta.base())
    }

    /// Top of the inheritance chain of `key`.
    pub(crate) fn root_of(&self, key: &TypeKey) -> TypeKey {
        let mut current = key.clone();
        for _ in 0..=self.registry.len() {
            match self.base_of(&current) {
                Some(base) => current = base,
                None => break,
            }
        }
        current
    }

    /// Whether a value of type `concrete` is a `ancestor` (same type or derived).
    pub(crate) fn is_assignable(&self, ancestor: &TypeKey, concrete: &TypeKey) -> bool {
        let mut current = concrete.clone();
        for _ in 0..=self.registry.len() {
            if current == *ancestor {
                return true;
            }
            match self.base_of(&current) {
                Some(base) => current = base,
                None => return false,
            }
        }
        false
    }

    pub(crate) fn create_instance(&self, key: &TypeKey) -> MessageValue {
        let factory = self.default_factory.read().clone();
        factory
            .and_then(|factory| factory(key))
            .unwrap_or_else(|| MessageValue::new(key.clone()))
    }

    // ------------------------------------------------------------------
    // Options
    // ------------------------------------------------------------------

    /// Apply an option change under the metadata lock.
    fn change_options(&self, change: impl FnOnce(&mut ModelOptions)) -> Result<()> {
        let _guard = self.take_lock()?;
        if self.is_frozen() {
            return Err(Error::frozen());
        }
        let mut next = self.options().clone();
        change(&mut next);
        if self.is_default.load(Ordering::Acquire) {
            default_model::check_default_invariants(&next, false)?;
        }
        *self.options.write() = next;
        Ok(())
    }
}

/// Runtime-configurable protobuf type model.
///
/// # Example
///
/// ```rust
/// use protomodel::{MessageShape, ProtoSyntax, ShapeCatalog, TypeKey, TypeModel, TypeShape};
/// use std::sync::Arc;
///
/// let catalog = Arc::new(ShapeCatalog::new());
/// catalog.insert(
///     "Demo.Point",
///     TypeShape::Message(
///         MessageShape::contract()
///             .field(1, "x", "builtin.i32")
///             .field(2, "y", "builtin.i32"),
///     ),
/// );
///
/// let model = TypeModel::new(catalog);
/// let point = TypeKey::new("Demo.Point");
/// model.add(&point, true)?;
/// let schema = model.get_schema(Some(&point), ProtoSyntax::Proto3)?;
/// assert!(schema.contains("message Point {"));
/// # Ok::<(), protomodel::Error>(())
/// ```
#[derive(Clone)]
pub struct TypeModel {
    pub(crate) core: Arc<ModelCore>,
}

impl fmt::Debug for TypeModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.core.fmt(f)
    }
}

impl TypeModel {
    /// Model over a shape catalog, with default options.
    pub fn new(catalog: Arc<ShapeCatalog>) -> Self {
        Self::builder().catalog(catalog).build()
    }

    /// Model over any introspector, with default options.
    pub fn with_introspector(introspector: Arc<dyn TypeIntrospector>) -> Self {
        Self::builder().introspector(introspector).build()
    }

    pub fn builder() -> TypeModelBuilder {
        TypeModelBuilder::new()
    }

    /// The catalog this model was built over, if it was built over one.
    pub fn catalog(&self) -> Option<Arc<ShapeCatalog>> {
        self.core.catalog.clone()
    }

    // ========================================================================
    // Registry
    // ========================================================================

    /// Register `key` explicitly.
    ///
    /// Returns the existing descriptor when the type is already registered.
    /// With `apply_defaults`, members and subtypes are taken from the
    /// introspected shape; otherwise the descriptor starts empty.
    pub fn add(&self, key: &TypeKey, apply_defaults: bool) -> Result<Arc<MetaType>> {
        self.core.add(key, apply_defaults)
    }

    /// Descriptor for `key`, created on demand according to `opts`.
    pub fn find_or_add(&self, key: &TypeKey, opts: FindOptions) -> Result<Option<Arc<MetaType>>> {
        self.core.find_or_add(key, opts)
    }

    /// Descriptor for `key`, created if the model accepts the type.
    pub fn meta(&self, key: &TypeKey) -> Result<Arc<MetaType>> {
        self.core
            .find_or_add(key, FindOptions::demand())?
            .ok_or_else(|| Error::UnexpectedType(key.clone()))
    }

    /// Descriptor at registry slot `index`.
    pub fn get(&self, index: usize) -> Option<Arc<MetaType>> {
        self.core.registry.at(index)
    }

    /// Registered descriptors in registration order.
    pub fn types(&self) -> Vec<Arc<MetaType>> {
        self.core.registry.snapshot().to_vec()
    }

    pub fn len(&self) -> usize {
        self.core.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a descriptor exists for `key`. Never adds.
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.core.registry.get(key).is_some()
            || self
                .core
                .registry
                .get(&self.core.effective_key(key))
                .is_some()
    }

    /// Every descriptor reachable from `key`, starting with its own.
    pub fn cascade(&self, key: &TypeKey) -> Result<Vec<Arc<MetaType>>> {
        let root = self.meta(key)?;
        self.core.cascade(root)
    }

    // ========================================================================
    // Serializers
    // ========================================================================

    pub fn resolve(&self, key: &TypeKey) -> Result<Arc<dyn Serializer>> {
        self.core.resolve(key, CompatibilityLevel::NotSpecified)
    }

    /// Resolve with a compatibility level inherited by newly created
    /// descriptors.
    pub fn resolve_with(
        &self,
        key: &TypeKey,
        ambient: CompatibilityLevel,
    ) -> Result<Arc<dyn Serializer>> {
        self.core.resolve(key, ambient)
    }

    /// Drop the cached serializer of `key`; the next resolution rebuilds it.
    pub fn reset_serializer(&self, key: &TypeKey) {
        self.core.reset_serializer(key);
    }

    /// Resolve every registered type eagerly. Returns the number of cached
    /// serializers.
    pub fn compile_in_place(&self) -> Result<usize> {
        self.core.compile_in_place()
    }

    pub fn serialize(&self, key: &TypeKey, value: &Value) -> Result<Vec<u8>> {
        let serializer = self.resolve(key)?;
        let mut out = WireWriter::new();
        serializer.write(value, &mut out)?;
        Ok(out.into_bytes())
    }

    pub fn deserialize(&self, key: &TypeKey, bytes: &[u8]) -> Result<Value> {
        let serializer = self.resolve(key)?;
        let mut input = WireReader::new(bytes);
        serializer.read(&mut input, None)
    }

    // ========================================================================
    // Schema
    // ========================================================================

    /// `.proto` text for `root` and everything it references, or for the
    /// whole model when `root` is `None`.
    pub fn get_schema(&self, root: Option<&TypeKey>, syntax: ProtoSyntax) -> Result<String> {
        self.get_schema_with(&SchemaOptions {
            root: root.cloned(),
            syntax,
            package: None,
        })
    }

    pub fn get_schema_with(&self, options: &SchemaOptions) -> Result<String> {
        self.core.get_schema(options)
    }

    // ========================================================================
    // Options
    // ========================================================================

    pub fn options(&self) -> ModelOptions {
        self.core.options().clone()
    }

    /// Install the factory used to create message instances on read.
    pub fn set_default_factory<F>(&self, factory: F) -> Result<()>
    where
        F: Fn(&TypeKey) -> Option<MessageValue> + Send + Sync + 'static,
    {
        let _guard = self.core.take_lock()?;
        if self.core.is_frozen() {
            return Err(Error::frozen());
        }
        *self.core.default_factory.write() = Some(Arc::new(factory));
        self.core.clear_serializers();
        Ok(())
    }

    pub fn set_auto_add_missing_types(&self, enabled: bool) -> Result<()> {
        self.core
            .change_options(|o| o.auto_add_missing_types = enabled)
    }

    pub fn set_auto_add_contract_types_only(&self, enabled: bool) -> Result<()> {
        self.core
            .change_options(|o| o.auto_add_contract_types_only = enabled)
    }

    pub fn set_implicit_zero_default(&self, enabled: bool) -> Result<()> {
        self.core
            .change_options(|o| o.implicit_zero_default = enabled)
    }

    /// Recorded only; see [`ModelOptions::intern_strings`](crate::config::ModelOptions::intern_strings).
    pub fn set_intern_strings(&self, enabled: bool) -> Result<()> {
        self.core.change_options(|o| o.intern_strings = enabled)
    }

    /// Only allowed before the first type is added.
    pub fn set_default_compatibility_level(&self, level: CompatibilityLevel) -> Result<()> {
        let _guard = self.core.take_lock()?;
        if !self.core.registry.is_empty() {
            return Err(Error::InvalidOperation(
                "the default compatibility level must be set before types are added".to_string(),
            ));
        }
        self.core
            .change_options(|o| o.default_compatibility_level = level)?;
        self.core.clear_serializers();
        Ok(())
    }

    pub fn set_metadata_timeout(&self, timeout: Duration) -> Result<()> {
        if timeout.is_zero() {
            return Err(Error::InvalidOperation(
                "the metadata timeout must be positive".to_string(),
            ));
        }
        self.core.change_options(|o| o.metadata_timeout = timeout)
    }

    // ========================================================================
    // Lock telemetry
    // ========================================================================

    /// Call `callback` whenever the metadata lock was contended while this
    /// thread held it.
    pub fn on_lock_contended<F>(&self, callback: F)
    where
        F: Fn(&LockContention) + Send + Sync + 'static,
    {
        self.core.lock.add_listener(Arc::new(ClosureListener::new(callback)));
    }

    pub fn add_lock_contention_listener(&self, listener: Arc<dyn LockContentionListener>) {
        self.core.lock.add_listener(listener);
    }

    pub fn lock_contention_count(&self) -> u64 {
        self.core.lock.contention_count()
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Reject further changes. Reads keep working.
    pub fn freeze(&self) -> Result<()> {
        let _guard = self.core.take_lock()?;
        if self.is_default() {
            return Err(Error::InvalidOperation(
                "the default model cannot be frozen".to_string(),
            ));
        }
        if !self.core.frozen.swap(true, Ordering::AcqRel) {
            log::debug!("[TypeModel] frozen with {} types", self.len());
        }
        Ok(())
    }

    pub fn is_frozen(&self) -> bool {
        self.core.is_frozen()
    }

    /// Install this model as the process-wide default.
    ///
    /// Fails, leaving the current default in place, when the model is frozen
    /// or does not auto-add types with implicit zero defaults.
    pub fn make_default(&self) -> Result<()> {
        default_model::promote(&self.core)
    }

    pub fn is_default(&self) -> bool {
        self.core.is_default.load(Ordering::Acquire)
    }

    /// The process-wide default model, created on first use.
    pub fn default_model() -> TypeModel {
        default_model::current()
    }
}

#[cfg(test)]
mod tests;
