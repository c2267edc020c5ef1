// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Descriptor arena and the find-or-add protocol.

use super::{FindOptions, ModelCore};
use crate::error::{Error, Result};
use crate::introspect::{ContractFamily, MessageShape, TypeShape};
use crate::meta::{insert_sorted, validate_number, CollectionProvider, MetaKind, MetaType, SubType, ValueMember};
use crate::types::{CompatibilityLevel, ScalarKind, TypeKey};
use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::sync::Arc;

/// Append-only arena of descriptors.
///
/// Reads are lock-free: the slot list is an atomically swapped snapshot and
/// the key index a concurrent map. Appends happen only under the model lock.
#[derive(Debug)]
pub(crate) struct Registry {
    slots: ArcSwap<Vec<Arc<MetaType>>>,
    index: DashMap<TypeKey, usize>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self {
            slots: ArcSwap::from_pointee(Vec::new()),
            index: DashMap::new(),
        }
    }

    pub(crate) fn get(&self, key: &TypeKey) -> Option<Arc<MetaType>> {
        let slot = *self.index.get(key)?;
        self.slots.load().get(slot).cloned()
    }

    pub(crate) fn at(&self, slot: usize) -> Option<Arc<MetaType>> {
        self.slots.load().get(slot).cloned()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.load().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.slots.load().is_empty()
    }

    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<MetaType>>> {
        self.slots.load_full()
    }

    /// Publish a descriptor. Caller holds the model lock.
    fn push(&self, meta: Arc<MetaType>) {
        let mut next = Vec::with_capacity(self.len() + 1);
        next.extend(self.slots.load().iter().cloned());
        let key = meta.key().clone();
        let slot = meta.index();
        next.push(meta);
        // Slot first: an index entry must always point at a published slot.
        self.slots.store(Arc::new(next));
        self.index.insert(key, slot);
    }
}

/// Members and subtypes of a message shape, validated.
fn prepare_message(key: &TypeKey, shape: &MessageShape) -> Result<(Vec<ValueMember>, Vec<SubType>)> {
    let mut members = Vec::with_capacity(shape.fields.len());
    for field in &shape.fields {
        validate_number(key, field.number, &members, &[])?;
        insert_sorted(&mut members, ValueMember::from(field.clone()));
    }
    let mut subtypes = Vec::with_capacity(shape.subtypes.len());
    for (number, ty) in &shape.subtypes {
        validate_number(key, *number, &members, &subtypes)?;
        subtypes.push(SubType {
            number: *number,
            ty: ty.clone(),
        });
    }
    Ok((members, subtypes))
}

impl ModelCore {
    /// Wait for a descriptor another thread is still configuring.
    fn ready(&self, meta: Arc<MetaType>) -> Result<Arc<MetaType>> {
        if meta.is_pending() {
            // Creation holds the lock for as long as the descriptor is pending.
            let _guard = self.take_lock()?;
        }
        Ok(meta)
    }

    /// Existing descriptor, without adding anything.
    pub(crate) fn lookup(&self, key: &TypeKey) -> Result<Option<Arc<MetaType>>> {
        let found = match self.registry.get(key) {
            Some(meta) => Some(meta),
            None => self.registry.get(&self.effective_key(key)),
        };
        found.map(|meta| self.ready(meta)).transpose()
    }

    pub(crate) fn find_or_add(
        &self,
        key: &TypeKey,
        opts: FindOptions,
    ) -> Result<Option<Arc<MetaType>>> {
        if let Some(meta) = self.registry.get(key) {
            return self.ready(meta).map(Some);
        }
        let key = self.effective_key(key);
        if let Some(meta) = self.registry.get(&key) {
            return self.ready(meta).map(Some);
        }
        if ScalarKind::from_key(&key).is_some() {
            return if opts.demand {
                Err(Error::InbuiltType(key))
            } else {
                Ok(None)
            };
        }

        let _guard = self.take_lock()?;
        if let Some(meta) = self.registry.get(&key) {
            return Ok(Some(meta));
        }

        let shape = self.shape_of(&key);
        if !self.is_addable(shape.as_ref(), opts) {
            log::trace!("[TypeModel] {} not added (no qualifying contract)", key);
            return if opts.demand {
                Err(Error::UnexpectedType(key))
            } else {
                Ok(None)
            };
        }
        if self.is_frozen() {
            return if opts.demand {
                Err(Error::frozen())
            } else {
                Ok(None)
            };
        }
        self.create(key, shape, true, opts.ambient).map(Some)
    }

    fn is_addable(&self, shape: Option<&TypeShape>, opts: FindOptions) -> bool {
        let options = self.options();
        let contract_only = opts.contract_only || options.auto_add_contract_types_only;
        match shape {
            None | Some(TypeShape::Nullable(_)) => opts.force_add,
            Some(TypeShape::Collection(_) | TypeShape::Map(..)) => opts.force_add,
            Some(TypeShape::Enum(_)) => opts.force_add || options.auto_add_missing_types,
            Some(TypeShape::Message(m)) => {
                if m.collection_item.is_some() && !m.ignore_collection_handling {
                    return opts.force_add;
                }
                m.family == ContractFamily::AutoTuple
                    || opts.force_add
                    || (options.auto_add_missing_types
                        && !(contract_only && m.family == ContractFamily::None))
            }
        }
    }

    /// Explicit registration. Returns the existing descriptor when the type is
    /// already known.
    pub(crate) fn add(&self, key: &TypeKey, apply_defaults: bool) -> Result<Arc<MetaType>> {
        if let Some(meta) = self.registry.get(key) {
            return self.ready(meta);
        }
        let key = self.effective_key(key);
        if ScalarKind::from_key(&key).is_some() {
            return Err(Error::InbuiltType(key));
        }
        if let Some(meta) = self.registry.get(&key) {
            return self.ready(meta);
        }
        if self.is_frozen() {
            return Err(Error::frozen());
        }

        let _guard = self.take_lock()?;
        if self.registry.get(&key).is_some() {
            return Err(Error::DuplicateType(key));
        }
        if self.is_frozen() {
            return Err(Error::frozen());
        }
        let shape = self.shape_of(&key);
        self.create(key, shape, apply_defaults, CompatibilityLevel::NotSpecified)
    }

    /// Create, publish and configure a descriptor. Caller holds the model lock.
    fn create(
        &self,
        key: TypeKey,
        shape: Option<TypeShape>,
        apply_defaults: bool,
        ambient: CompatibilityLevel,
    ) -> Result<Arc<MetaType>> {
        let (kind, family) = match &shape {
            Some(TypeShape::Enum(_)) => (MetaKind::Enum, ContractFamily::None),
            Some(TypeShape::Collection(_) | TypeShape::Map(..)) => {
                (MetaKind::Collection, ContractFamily::None)
            }
            Some(TypeShape::Message(m)) => {
                let kind = if m.collection_item.is_some() && !m.ignore_collection_handling {
                    MetaKind::Collection
                } else {
                    MetaKind::Message
                };
                (kind, m.family)
            }
            Some(TypeShape::Nullable(_)) | None => (MetaKind::Message, ContractFamily::None),
        };

        // Validate before publishing so a bad shape never leaves a half-built entry.
        let prepared = match (&shape, apply_defaults) {
            (Some(TypeShape::Message(m)), true) => Some(prepare_message(&key, m)?),
            _ => None,
        };

        let declared = match &shape {
            Some(TypeShape::Message(m)) => m.compatibility,
            _ => CompatibilityLevel::NotSpecified,
        };
        let level = declared
            .or(ambient)
            .or(self.options().default_compatibility_level);

        let meta = Arc::new(MetaType::new(
            self.registry.len(),
            key,
            kind,
            family,
            self.weak_self.clone(),
            level,
        ));
        self.registry.push(Arc::clone(&meta));

        if apply_defaults {
            self.apply_defaults(&meta, shape, prepared);
        }
        meta.mark_ready();

        log::debug!(
            "[TypeModel] added {} as #{} ({:?}, {:?})",
            meta.key(),
            meta.index(),
            kind,
            family
        );
        Ok(meta)
    }

    /// Registered type that declares `meta` as one of its subtypes.
    fn declaring_base(&self, meta: &MetaType) -> Option<TypeKey> {
        self.registry
            .snapshot()
            .iter()
            .filter(|other| other.index() != meta.index())
            .find(|other| other.subtypes().iter().any(|sub| sub.ty == *meta.key()))
            .map(|other| other.key().clone())
    }

    /// Point already registered subtypes without a base at `meta`.
    fn adopt_subtypes(&self, meta: &MetaType, subtypes: &[SubType]) {
        for sub in subtypes.iter().filter(|sub| sub.ty != *meta.key()) {
            if let Some(derived) = self.registry.get(&sub.ty) {
                let mut cfg = derived.config_mut();
                if cfg.base.is_some() {
                    continue;
                }
                cfg.base = Some(meta.key().clone());
                drop(cfg);
                self.reset_serializer(&sub.ty);
            }
        }
    }

    fn apply_defaults(
        &self,
        meta: &MetaType,
        shape: Option<TypeShape>,
        prepared: Option<(Vec<ValueMember>, Vec<SubType>)>,
    ) {
        let declared_base = match &shape {
            Some(TypeShape::Message(m)) if m.base.is_none() => self.declaring_base(meta),
            _ => None,
        };
        let mut cfg = meta.config_mut();
        match shape {
            Some(TypeShape::Enum(e)) => {
                cfg.name = e.name.clone();
                cfg.enum_shape = Some(e);
            }
            Some(TypeShape::Collection(item)) => {
                cfg.collection = Some(CollectionProvider::repeated(item));
            }
            Some(TypeShape::Map(k, v)) => {
                cfg.collection = Some(self.map_provider(k, v));
            }
            Some(TypeShape::Message(m)) => {
                if let Some((members, subtypes)) = prepared {
                    self.adopt_subtypes(meta, &subtypes);
                    cfg.members = members;
                    cfg.subtypes = subtypes;
                }
                cfg.name = m.name;
                cfg.base = m.base.or(declared_base);
                cfg.surrogate = m.surrogate;
                cfg.generic_args = m.generic_args;
                cfg.ignore_collection_handling = m.ignore_collection_handling;
                cfg.external = m.external;
                if meta.kind() == MetaKind::Collection {
                    cfg.collection = m.collection_item.map(CollectionProvider::repeated);
                }
            }
            Some(TypeShape::Nullable(_)) | None => {}
        }
    }
}
