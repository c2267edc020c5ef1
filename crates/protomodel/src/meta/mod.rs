// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors ("meta types").
//!
//! A [`MetaType`] is the serialization contract of one runtime type inside one
//! model. Descriptors live in the model's arena and refer to each other by
//! [`TypeKey`] only, so cyclic type graphs never form ownership cycles.
//!
//! # Lifecycle
//!
//! ```text
//! created (Pending) -> defaults applied -> Ready
//! ```
//!
//! A pending descriptor is visible to concurrent lookups for identity only;
//! callers that find one wait on the model lock until it is ready. After
//! that, members may still be configured until the model is frozen.

mod collection;
mod member;

pub use collection::CollectionProvider;
pub use member::{SubType, ValueMember};

pub(crate) use member::{insert_sorted, validate_number};

use crate::error::{Error, Result};
use crate::introspect::{ContractFamily, EnumShape, FieldShape};
use crate::model::{FindOptions, ModelCore};
use crate::serializer::Serializer;
use crate::types::{CompatibilityLevel, TypeKey};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// What a descriptor stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaKind {
    Message,
    Enum,
    /// A collection type registered explicitly; serialized inline as a
    /// repeated field.
    Collection,
}

/// Mutable part of a descriptor.
#[derive(Debug, Default)]
pub(crate) struct MetaConfig {
    pub(crate) name: Option<String>,
    pub(crate) members: Vec<ValueMember>,
    pub(crate) subtypes: Vec<SubType>,
    pub(crate) base: Option<TypeKey>,
    pub(crate) surrogate: Option<TypeKey>,
    pub(crate) compatibility: CompatibilityLevel,
    pub(crate) generic_args: Vec<TypeKey>,
    pub(crate) ignore_collection_handling: bool,
    pub(crate) collection: Option<CollectionProvider>,
    pub(crate) enum_shape: Option<EnumShape>,
    /// Declared as bringing its own serializer.
    pub(crate) external: bool,
    pub(crate) serializer: Option<Arc<dyn Serializer>>,
}

/// Serialization contract of one runtime type.
#[derive(Debug)]
pub struct MetaType {
    index: usize,
    key: TypeKey,
    kind: MetaKind,
    family: ContractFamily,
    pending: AtomicBool,
    model: Weak<ModelCore>,
    config: RwLock<MetaConfig>,
}

impl MetaType {
    /// New descriptor, pending until [`MetaType::mark_ready`].
    pub(crate) fn new(
        index: usize,
        key: TypeKey,
        kind: MetaKind,
        family: ContractFamily,
        model: Weak<ModelCore>,
        compatibility: CompatibilityLevel,
    ) -> Self {
        Self {
            index,
            key,
            kind,
            family,
            pending: AtomicBool::new(true),
            model,
            config: RwLock::new(MetaConfig {
                compatibility,
                ..MetaConfig::default()
            }),
        }
    }

    pub(crate) fn mark_ready(&self) {
        self.pending.store(false, Ordering::Release);
    }

    pub(crate) fn config(&self) -> RwLockReadGuard<'_, MetaConfig> {
        self.config.read()
    }

    pub(crate) fn config_mut(&self) -> RwLockWriteGuard<'_, MetaConfig> {
        self.config.write()
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    /// Stable slot in the model's arena.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn kind(&self) -> MetaKind {
        self.kind
    }

    pub fn family(&self) -> ContractFamily {
        self.family
    }

    /// Default configuration is still being applied.
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub fn is_auto_tuple(&self) -> bool {
        self.family == ContractFamily::AutoTuple
    }

    // ------------------------------------------------------------------
    // Configuration (read)
    // ------------------------------------------------------------------

    /// Explicit schema name, if one was set.
    pub fn name(&self) -> Option<String> {
        self.config.read().name.clone()
    }

    /// Members in field-number order.
    pub fn members(&self) -> Vec<ValueMember> {
        self.config.read().members.clone()
    }

    pub fn member(&self, number: u32) -> Option<ValueMember> {
        self.config
            .read()
            .members
            .iter()
            .find(|m| m.number() == number)
            .cloned()
    }

    pub fn subtypes(&self) -> Vec<SubType> {
        self.config.read().subtypes.clone()
    }

    pub fn base(&self) -> Option<TypeKey> {
        self.config.read().base.clone()
    }

    pub fn surrogate(&self) -> Option<TypeKey> {
        self.config.read().surrogate.clone()
    }

    pub fn compatibility_level(&self) -> CompatibilityLevel {
        self.config.read().compatibility
    }

    pub fn generic_args(&self) -> Vec<TypeKey> {
        self.config.read().generic_args.clone()
    }

    pub fn ignore_collection_handling(&self) -> bool {
        self.config.read().ignore_collection_handling
    }

    pub fn collection(&self) -> Option<CollectionProvider> {
        self.config.read().collection.clone()
    }

    pub fn enum_shape(&self) -> Option<EnumShape> {
        self.config.read().enum_shape.clone()
    }

    /// The type is serialized by something other than the model.
    pub fn is_external(&self) -> bool {
        let cfg = self.config.read();
        cfg.external || cfg.serializer.is_some()
    }

    // ------------------------------------------------------------------
    // Configuration (write)
    // ------------------------------------------------------------------

    fn open_model(&self) -> Result<Arc<ModelCore>> {
        let core = self.model.upgrade().ok_or(Error::ModelDropped)?;
        if core.is_frozen() {
            return Err(Error::frozen());
        }
        Ok(core)
    }

    /// Add a member.
    pub fn add_field(&self, field: FieldShape) -> Result<()> {
        let core = self.open_model()?;
        {
            let mut cfg = self.config.write();
            validate_number(&self.key, field.number, &cfg.members, &cfg.subtypes)?;
            log::debug!(
                "[TypeModel] {}: member {} '{}' ({})",
                self.key,
                field.number,
                field.name,
                field.ty
            );
            insert_sorted(&mut cfg.members, ValueMember::from(field));
        }
        core.reset_serializer(&self.key);
        Ok(())
    }

    /// Declare `ty` as a subtype carried under field `number`.
    ///
    /// The subtype is registered if needed and its base set to this type.
    pub fn add_subtype(&self, number: u32, ty: impl Into<TypeKey>) -> Result<()> {
        let ty = ty.into();
        let core = self.open_model()?;
        if ty == self.key {
            return Err(Error::InvalidMember {
                owner: self.key.clone(),
                reason: "a type cannot be its own subtype".to_string(),
            });
        }
        {
            let cfg = self.config.read();
            validate_number(&self.key, number, &cfg.members, &cfg.subtypes)?;
        }

        let derived = core
            .find_or_add(&ty, FindOptions::demand().force())?
            .ok_or_else(|| Error::UnexpectedType(ty.clone()))?;
        self.check_free_base(&ty, derived.base())?;

        {
            let mut cfg = self.config.write();
            validate_number(&self.key, number, &cfg.members, &cfg.subtypes)?;
            cfg.subtypes.push(SubType {
                number,
                ty: ty.clone(),
            });
        }
        {
            let mut derived_cfg = derived.config_mut();
            // Another base may have claimed the type meanwhile.
            if let Err(err) = self.check_free_base(&ty, derived_cfg.base.clone()) {
                drop(derived_cfg);
                self.config
                    .write()
                    .subtypes
                    .retain(|sub| !(sub.number == number && sub.ty == ty));
                return Err(err);
            }
            derived_cfg.base = Some(self.key.clone());
        }
        core.reset_serializer(&self.key);
        core.reset_serializer(&ty);
        Ok(())
    }

    /// `ty` may only gain this type as its base.
    fn check_free_base(&self, ty: &TypeKey, base: Option<TypeKey>) -> Result<()> {
        match base {
            Some(other) if other != self.key => Err(Error::InvalidMember {
                owner: self.key.clone(),
                reason: format!("{} already derives from {}", ty, other),
            }),
            _ => Ok(()),
        }
    }

    /// Serialize through `surrogate` instead (or stop doing so with `None`).
    pub fn set_surrogate(&self, surrogate: Option<TypeKey>) -> Result<()> {
        let core = self.open_model()?;
        self.config.write().surrogate = surrogate;
        core.reset_serializer(&self.key);
        Ok(())
    }

    /// Override the schema name.
    pub fn set_name(&self, name: impl Into<String>) -> Result<()> {
        let core = self.open_model()?;
        self.config.write().name = Some(name.into());
        core.reset_serializer(&self.key);
        Ok(())
    }

    pub fn set_compatibility_level(&self, level: CompatibilityLevel) -> Result<()> {
        let core = self.open_model()?;
        self.config.write().compatibility = level;
        core.reset_serializer(&self.key);
        Ok(())
    }

    /// Hand serialization of this type to an external serializer.
    pub fn set_serializer(&self, serializer: Arc<dyn Serializer>) -> Result<()> {
        let core = self.open_model()?;
        self.config.write().serializer = Some(serializer);
        core.reset_serializer(&self.key);
        Ok(())
    }
}
