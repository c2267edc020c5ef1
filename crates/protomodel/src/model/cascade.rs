// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Discovery of every type reachable from a descriptor.

use super::{FindOptions, ModelCore};
use crate::error::Result;
use crate::meta::{CollectionProvider, MetaType};
use crate::types::{ScalarKind, TypeKey};
use std::collections::HashSet;
use std::sync::Arc;

/// Accumulated state of one walk.
#[derive(Default)]
pub(crate) struct Cascade {
    visited: HashSet<usize>,
    collections: HashSet<TypeKey>,
    found: Vec<Arc<MetaType>>,
}

impl Cascade {
    pub(crate) fn into_found(self) -> Vec<Arc<MetaType>> {
        self.found
    }
}

impl ModelCore {
    /// Surrogate (if registered) or the descriptor itself.
    pub(crate) fn canonical(&self, meta: Arc<MetaType>) -> Result<Arc<MetaType>> {
        match meta.surrogate() {
            Some(surrogate) => Ok(self
                .find_or_add(&surrogate, FindOptions::lookup())?
                .unwrap_or(meta)),
            None => Ok(meta),
        }
    }

    /// Walk `meta` and everything it references.
    ///
    /// `up` walks the base chain, `down` the declared subtypes; a base is
    /// never walked back down and a subtype never back up.
    pub(crate) fn cascade_into(
        &self,
        meta: Arc<MetaType>,
        state: &mut Cascade,
        up: bool,
        down: bool,
    ) -> Result<()> {
        let meta = self.canonical(meta)?;
        if !state.visited.insert(meta.index()) {
            return Ok(());
        }
        log::trace!("[TypeModel] cascade visits {}", meta.key());
        state.found.push(Arc::clone(&meta));

        for member in meta.members() {
            self.cascade_type(member.ty(), state)?;
        }
        for arg in meta.generic_args() {
            self.cascade_type(&arg, state)?;
        }
        if let Some(provider) = meta.collection() {
            self.cascade_provider(provider, state)?;
        }
        if down {
            for sub in meta.subtypes() {
                if let Some(derived) = self.find_or_add(&sub.ty, FindOptions::lookup())? {
                    self.cascade_into(derived, state, false, true)?;
                }
            }
        }
        if up {
            if let Some(base) = meta.base() {
                if let Some(base) = self.find_or_add(&base, FindOptions::lookup())? {
                    self.cascade_into(base, state, true, false)?;
                }
            }
        }
        Ok(())
    }

    fn cascade_type(&self, ty: &TypeKey, state: &mut Cascade) -> Result<()> {
        if ScalarKind::from_key(ty).is_some() {
            return Ok(());
        }
        let effective = self.effective_key(ty);
        if ScalarKind::from_key(&effective).is_some() {
            return Ok(());
        }
        if let Some(provider) = self.collection_provider(&effective) {
            if !state.collections.insert(effective) {
                return Ok(());
            }
            return self.cascade_provider(provider, state);
        }
        if let Some(meta) = self.find_or_add(&effective, FindOptions::lookup())? {
            self.cascade_into(meta, state, true, true)?;
        }
        Ok(())
    }

    fn cascade_provider(&self, provider: CollectionProvider, state: &mut Cascade) -> Result<()> {
        match &provider {
            CollectionProvider::Repeated { item } => self.cascade_type(item, state),
            CollectionProvider::Map { key, value, .. } => {
                self.cascade_type(key, state)?;
                self.cascade_type(value, state)?;
                if !provider.is_valid_map() {
                    let pair = self.ensure_pair_shape(key, value);
                    if let Some(meta) = self.find_or_add(&pair, FindOptions::lookup())? {
                        self.cascade_into(meta, state, true, true)?;
                    }
                }
                Ok(())
            }
        }
    }

    pub(crate) fn cascade(&self, root: Arc<MetaType>) -> Result<Vec<Arc<MetaType>>> {
        let mut state = Cascade::default();
        self.cascade_into(root, &mut state, true, true)?;
        Ok(state.into_found())
    }
}
