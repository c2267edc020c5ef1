// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide default model slot.
//!
//! Created on first use with an empty [`ShapeCatalog`]. Promoting another
//! model swaps the slot under its own mutex, independent of any model's
//! metadata lock.

use super::{ModelCore, TypeModel};
use crate::config::ModelOptions;
use crate::error::{Error, Result};
use crate::introspect::{ShapeCatalog, TypeIntrospector};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::sync::atomic::Ordering;
use std::sync::{Arc, OnceLock};

struct DefaultSlot {
    current: ArcSwap<ModelCore>,
    swap: Mutex<()>,
}

static DEFAULT_SLOT: OnceLock<DefaultSlot> = OnceLock::new();

fn slot() -> &'static DefaultSlot {
    DEFAULT_SLOT.get_or_init(|| {
        let catalog = Arc::new(ShapeCatalog::new());
        let introspector: Arc<dyn TypeIntrospector> = catalog.clone();
        let core = ModelCore::new(introspector, Some(catalog), ModelOptions::from_env());
        core.is_default.store(true, Ordering::Release);
        log::debug!("[TypeModel] default model created");
        DefaultSlot {
            current: ArcSwap::new(core),
            swap: Mutex::new(()),
        }
    })
}

/// Options a default model must keep.
pub(crate) fn check_default_invariants(options: &ModelOptions, frozen: bool) -> Result<()> {
    if frozen {
        return Err(Error::InvalidOperation(
            "the default model cannot be frozen".to_string(),
        ));
    }
    if !options.auto_add_missing_types {
        return Err(Error::InvalidOperation(
            "the default model must auto-add missing types".to_string(),
        ));
    }
    if !options.implicit_zero_default {
        return Err(Error::InvalidOperation(
            "the default model must use implicit zero defaults".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn current() -> TypeModel {
    TypeModel {
        core: slot().current.load_full(),
    }
}

/// Install `core` as the default model.
pub(crate) fn promote(core: &Arc<ModelCore>) -> Result<()> {
    let slot = slot();
    let _swap = slot.swap.lock();
    {
        // Hold the metadata lock so freeze/option changes cannot interleave.
        let _guard = core.take_lock()?;
        check_default_invariants(&core.options(), core.is_frozen())?;
        core.is_default.store(true, Ordering::Release);
    }

    let previous = slot.current.swap(Arc::clone(core));
    if !Arc::ptr_eq(&previous, core) {
        previous.is_default.store(false, Ordering::Release);
        log::debug!("[TypeModel] default model replaced");
    }
    Ok(())
}
