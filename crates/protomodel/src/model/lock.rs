// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Coarse metadata lock with contention telemetry.
//!
//! One reentrant lock guards descriptor creation, option changes and the
//! freeze transition. Acquisition that does not succeed immediately bumps a
//! contention counter and then waits up to the metadata timeout. The
//! outermost holder compares the counter on release with its value at
//! acquisition and, when somebody had to wait, reports its own call stack
//! to the contention listeners.

use crate::error::{Error, Result};
use parking_lot::{ReentrantMutex, ReentrantMutexGuard, RwLock};
use std::backtrace::Backtrace;
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Contention observed while a thread held the metadata lock.
#[derive(Debug, Clone)]
pub struct LockContention {
    /// Call stack of the holder, captured when it released the lock.
    pub backtrace: String,
    /// Contention counter at release.
    pub total_contentions: u64,
}

/// Receives lock contention reports.
///
/// Called on the thread that held the lock, after it released it. Must not
/// block.
pub trait LockContentionListener: Send + Sync {
    fn on_lock_contended(&self, event: &LockContention);
}

/// Closure-based listener.
pub struct ClosureListener<F: Fn(&LockContention) + Send + Sync> {
    callback: F,
}

impl<F: Fn(&LockContention) + Send + Sync> ClosureListener<F> {
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F: Fn(&LockContention) + Send + Sync> LockContentionListener for ClosureListener<F> {
    fn on_lock_contended(&self, event: &LockContention) {
        (self.callback)(event);
    }
}

pub(crate) struct ModelLock {
    /// Reentrancy depth of the current holder.
    mutex: ReentrantMutex<Cell<u32>>,
    contentions: AtomicU64,
    listeners: RwLock<Vec<Arc<dyn LockContentionListener>>>,
}

impl std::fmt::Debug for ModelLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelLock")
            .field("contentions", &self.contentions.load(Ordering::Relaxed))
            .field("listeners", &self.listeners.read().len())
            .finish()
    }
}

impl ModelLock {
    pub(crate) fn new() -> Self {
        Self {
            mutex: ReentrantMutex::new(Cell::new(0)),
            contentions: AtomicU64::new(0),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Acquire within `timeout`.
    pub(crate) fn take(&self, timeout: Duration) -> Result<ModelLockGuard<'_>> {
        let guard = match self.mutex.try_lock() {
            Some(guard) => guard,
            None => {
                self.contentions.fetch_add(1, Ordering::AcqRel);
                match self.mutex.try_lock_for(timeout) {
                    Some(guard) => guard,
                    None => {
                        log::warn!(
                            "[ModelLock] timeout after {}ms waiting for the metadata lock",
                            timeout.as_millis()
                        );
                        return Err(Error::Timeout(timeout));
                    }
                }
            }
        };

        let depth = guard.get() + 1;
        guard.set(depth);
        let snapshot = if depth == 1 {
            self.contentions.load(Ordering::Acquire)
        } else {
            0
        };
        Ok(ModelLockGuard {
            lock: self,
            guard: Some(guard),
            snapshot,
        })
    }

    pub(crate) fn contention_count(&self) -> u64 {
        self.contentions.load(Ordering::Acquire)
    }

    pub(crate) fn add_listener(&self, listener: Arc<dyn LockContentionListener>) {
        self.listeners.write().push(listener);
    }

    fn report(&self, total_contentions: u64) {
        let event = LockContention {
            backtrace: Backtrace::force_capture().to_string(),
            total_contentions,
        };
        log::warn!(
            "[ModelLock] metadata lock was contended while held (total contentions: {})",
            total_contentions
        );
        let listeners = self.listeners.read().clone();
        for listener in listeners {
            listener.on_lock_contended(&event);
        }
    }
}

pub(crate) struct ModelLockGuard<'a> {
    lock: &'a ModelLock,
    guard: Option<ReentrantMutexGuard<'a, Cell<u32>>>,
    snapshot: u64,
}

impl Drop for ModelLockGuard<'_> {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        let depth = guard.get().saturating_sub(1);
        guard.set(depth);
        drop(guard);

        if depth == 0 {
            let now = self.lock.contentions.load(Ordering::Acquire);
            if now != self.snapshot {
                self.lock.report(now);
            }
        }
    }
}
