// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Save/load context: the handles a [`crate::Savable`] impl may need
//! beyond the bundle itself (an event loop handle, a communicator, the
//! owning process), threaded through as a type-keyed extension map so
//! `corral-persistence` doesn't need to depend on every crate that wants
//! to stash something in it.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

/// A small type-keyed bag of `Arc`-shared values, the same shape as
/// `http::Extensions`. At most one value per concrete type is stored.
#[derive(Default, Clone)]
pub struct Extensions {
    values: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Extensions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.values.insert(TypeId::of::<T>(), Arc::new(value));
        self
    }

    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.values.get(&TypeId::of::<T>()).and_then(|v| v.clone().downcast::<T>().ok())
    }
}

impl std::fmt::Debug for Extensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extensions").field("len", &self.values.len()).finish()
    }
}

/// Context passed to [`crate::Savable::save`].
#[derive(Default, Clone, Debug)]
pub struct SaveContext {
    pub extensions: Extensions,
}

impl SaveContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }
}

/// Context passed to [`crate::Savable::load`]. Carries the same extension
/// bag as [`SaveContext`] plus a copy-extend helper matching the reference
/// implementation's `LoadSaveContext.copyextend`.
#[derive(Default, Clone, Debug)]
pub struct LoadContext {
    pub extensions: Extensions,
}

impl LoadContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.extensions.insert(value);
        self
    }

    /// Return a new context with `value` added, leaving `self` untouched.
    pub fn copy_extend<T: Send + Sync + 'static>(&self, value: T) -> Self {
        let mut copy = self.clone();
        copy.extensions.insert(value);
        copy
    }
}
