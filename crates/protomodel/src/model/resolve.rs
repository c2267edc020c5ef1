// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serializer resolution and the serializer caches.
//!
//! Three caches, each with its own narrow lock for double-checked filling:
//! the basic cache (built-in scalars), the type cache (one serializer per
//! runtime type) and the field cache (repeated/map serializers specialised
//! by member format). Hits never lock.

use super::{Cascade, FieldKey, FindOptions, ModelCore};
use crate::error::{Error, Result};
use crate::introspect::TypeShape;
use crate::meta::{CollectionProvider, MetaKind, MetaType, ValueMember};
use crate::serializer::{
    EnumSerializer, ExternalHandle, MapSerializer, MessageSerializer, RepeatedSerializer,
    ScalarSerializer, Serializer, SurrogateSerializer,
};
use crate::types::{CompatibilityLevel, DataFormat, ScalarKind, TypeKey};
use std::sync::Arc;

impl ModelCore {
    pub(crate) fn resolve(
        &self,
        key: &TypeKey,
        ambient: CompatibilityLevel,
    ) -> Result<Arc<dyn Serializer>> {
        if let Some(hit) = self.serializers.get(key) {
            return Ok(Arc::clone(hit.value()));
        }

        let _cache = self.cache_lock.lock();
        if let Some(hit) = self.serializers.get(key) {
            return Ok(Arc::clone(hit.value()));
        }

        let serializer = self.build_serializer(key, ambient)?;
        log::debug!(
            "[SerializerCache] cached {} ({:#06x})",
            key,
            serializer.features().0
        );
        self.serializers.insert(key.clone(), Arc::clone(&serializer));
        Ok(serializer)
    }

    fn build_serializer(
        &self,
        key: &TypeKey,
        ambient: CompatibilityLevel,
    ) -> Result<Arc<dyn Serializer>> {
        let effective = self.effective_key(key);
        let level = ambient.or(self.options().default_compatibility_level);

        if let Some(kind) = ScalarKind::from_key(&effective) {
            return Ok(self.basic_serializer(kind, DataFormat::Default, level));
        }

        // Enums never get a descriptor through resolution.
        if let Some(TypeShape::Enum(shape)) = self.shape_of(&effective) {
            return Ok(Arc::new(EnumSerializer::new(effective, shape)));
        }

        if let Some(provider) = self.collection_provider(&effective) {
            return Ok(self.collection_serializer(
                effective,
                provider,
                DataFormat::Default,
                false,
                DataFormat::Default,
                level,
            ));
        }

        let meta = self
            .find_or_add(&effective, FindOptions::lookup().ambient(ambient))?
            .ok_or_else(|| Error::NoSerializerAvailable(key.clone()))?;
        let serializer = self.meta_serializer(&meta)?;
        Ok(serializer.external().unwrap_or(serializer))
    }

    /// Serializer of a descriptor, built from a snapshot of its configuration.
    pub(crate) fn meta_serializer(&self, meta: &MetaType) -> Result<Arc<dyn Serializer>> {
        let cfg = meta.config();
        if let Some(external) = &cfg.serializer {
            return Ok(Arc::new(ExternalHandle::new(Arc::clone(external))));
        }
        if cfg.external {
            return Err(Error::NoSerializerAvailable(meta.key().clone()));
        }

        let level = cfg
            .compatibility
            .or(self.options().default_compatibility_level);
        if let Some(surrogate) = &cfg.surrogate {
            return Ok(Arc::new(SurrogateSerializer::new(
                meta.key().clone(),
                surrogate.clone(),
                level,
                self.weak_self.clone(),
            )));
        }

        let serializer: Arc<dyn Serializer> = match meta.kind() {
            MetaKind::Enum => Arc::new(EnumSerializer::new(
                meta.key().clone(),
                cfg.enum_shape.clone().unwrap_or_default(),
            )),
            MetaKind::Collection => {
                let provider = cfg
                    .collection
                    .clone()
                    .ok_or_else(|| Error::NoSerializerAvailable(meta.key().clone()))?;
                self.collection_serializer(
                    meta.key().clone(),
                    provider,
                    DataFormat::Default,
                    false,
                    DataFormat::Default,
                    level,
                )
            }
            MetaKind::Message => Arc::new(MessageSerializer::new(
                meta.key().clone(),
                cfg.base.clone(),
                cfg.members.clone(),
                cfg.subtypes.clone(),
                level,
                self.default_factory.read().is_some(),
                self.weak_self.clone(),
            )),
        };
        Ok(serializer)
    }

    fn collection_serializer(
        &self,
        key: TypeKey,
        provider: CollectionProvider,
        format: DataFormat,
        packed: bool,
        map_key_format: DataFormat,
        level: CompatibilityLevel,
    ) -> Arc<dyn Serializer> {
        match provider {
            CollectionProvider::Repeated { item } => Arc::new(RepeatedSerializer::new(
                key,
                item,
                format,
                packed,
                level,
                self.weak_self.clone(),
            )),
            CollectionProvider::Map { key: k, value, .. } => Arc::new(MapSerializer::new(
                key,
                k,
                value,
                map_key_format,
                format,
                level,
                self.weak_self.clone(),
            )),
        }
    }

    pub(crate) fn basic_serializer(
        &self,
        kind: ScalarKind,
        format: DataFormat,
        level: CompatibilityLevel,
    ) -> Arc<dyn Serializer> {
        let cache_key = (kind, format, level.effective());
        if let Some(hit) = self.basic.get(&cache_key) {
            return Arc::clone(hit.value());
        }
        let _basic = self.basic_lock.lock();
        if let Some(hit) = self.basic.get(&cache_key) {
            return Arc::clone(hit.value());
        }
        let built: Arc<dyn Serializer> = Arc::new(ScalarSerializer::new(kind, format, level));
        self.basic.insert(cache_key, Arc::clone(&built));
        built
    }

    /// Serializer for a value of type `ty` written as a field with the given
    /// member settings.
    pub(crate) fn field_serializer(
        &self,
        ty: &TypeKey,
        format: DataFormat,
        packed: bool,
        map_key_format: DataFormat,
        level: CompatibilityLevel,
    ) -> Result<Arc<dyn Serializer>> {
        if let Some(kind) = ScalarKind::from_key(ty) {
            return Ok(self.basic_serializer(kind, format, level));
        }
        let field_key: FieldKey = (ty.clone(), format, packed, map_key_format, level.effective());
        if let Some(hit) = self.fields.get(&field_key) {
            return Ok(Arc::clone(hit.value()));
        }

        let effective = self.effective_key(ty);
        let built = if let Some(kind) = ScalarKind::from_key(&effective) {
            self.basic_serializer(kind, format, level)
        } else if let Some(provider) = self.collection_provider(&effective) {
            self.collection_serializer(effective, provider, format, packed, map_key_format, level)
        } else {
            self.resolve(&effective, level)?
        };
        self.fields.insert(field_key, Arc::clone(&built));
        Ok(built)
    }

    pub(crate) fn member_serializer(
        &self,
        member: &ValueMember,
        level: CompatibilityLevel,
    ) -> Result<Arc<dyn Serializer>> {
        self.field_serializer(
            member.ty(),
            member.format(),
            member.is_packed(),
            member.map_key_format(),
            member.compatibility_level().or(level),
        )
    }

    /// Serializer for one item of a repeated field or map.
    pub(crate) fn element_serializer(
        &self,
        ty: &TypeKey,
        format: DataFormat,
        level: CompatibilityLevel,
    ) -> Result<Arc<dyn Serializer>> {
        if self.collection_provider(&self.effective_key(ty)).is_some() {
            return Err(Error::NotSupported(format!(
                "nested collections cannot be items of a repeated field: {}",
                ty
            )));
        }
        self.field_serializer(ty, format, false, DataFormat::Default, level)
    }

    pub(crate) fn reset_serializer(&self, key: &TypeKey) {
        if self.serializers.remove(key).is_some() {
            log::debug!("[SerializerCache] reset {}", key);
        }
        // Field entries may hold the old instance under wrapper keys.
        self.fields.clear();
    }

    pub(crate) fn clear_serializers(&self) {
        self.serializers.clear();
        self.fields.clear();
    }

    /// Register the dependency closure of every registered type, then resolve
    /// all of it. Returns how many serializers are cached.
    pub(crate) fn compile_in_place(&self) -> Result<usize> {
        let mut closure = Cascade::default();
        for meta in self.registry.snapshot().iter() {
            self.cascade_into(Arc::clone(meta), &mut closure, true, true)?;
        }
        for meta in closure.into_found() {
            if meta.is_external() && meta.config().serializer.is_none() {
                continue;
            }
            self.resolve(meta.key(), CompatibilityLevel::NotSpecified)?;
        }
        let cached = self.serializers.len();
        log::debug!("[SerializerCache] compiled {} serializers", cached);
        Ok(cached)
    }
}
