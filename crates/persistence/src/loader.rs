// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Object loader: a build-time-registered table mapping stable string ids
//! to constructors, standing in for dynamic class loading by
//! fully-qualified name.

use crate::bundle::Bundle;
use crate::context::LoadContext;
use crate::error::PersistError;
use std::collections::HashMap;

type Constructor<T> =
    Box<dyn Fn(&Bundle, &LoadContext) -> Result<Box<T>, PersistError> + Send + Sync>;

/// Resolves a stable string id (the reference form is `"module:qualname"`;
/// here a flat `"crate::Type"`-shaped key) to a constructor that rebuilds a
/// `Box<T>` from a bundle. `T` is typically a trait object shared by every
/// registrable implementation (e.g. `dyn ErasedProcessBehavior`).
pub trait ObjectLoader<T: ?Sized>: Send + Sync {
    fn load(&self, bundle: &Bundle, ctx: &LoadContext) -> Result<Box<T>, PersistError>;

    fn is_registered(&self, class_name: &str) -> bool;
}

/// An [`ObjectLoader`] backed by a registration table populated at
/// startup, the way a process class of build-time-registered adapters
/// would be resolved by name.
pub struct StaticLoader<T: ?Sized> {
    constructors: HashMap<String, Constructor<T>>,
}

impl<T: ?Sized> Default for StaticLoader<T> {
    fn default() -> Self {
        Self { constructors: HashMap::new() }
    }
}

impl<T: ?Sized> StaticLoader<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor under `class_name`. Callers pass a closure
    /// that typically calls some concrete type's `Savable::load` and boxes
    /// the result into `T` (e.g. `Box<dyn ErasedProcessBehavior>`).
    pub fn register(
        &mut self,
        class_name: impl Into<String>,
        ctor: impl Fn(&Bundle, &LoadContext) -> Result<Box<T>, PersistError> + Send + Sync + 'static,
    ) -> &mut Self {
        self.constructors.insert(class_name.into(), Box::new(ctor));
        self
    }
}

impl<T: ?Sized> ObjectLoader<T> for StaticLoader<T> {
    fn load(&self, bundle: &Bundle, ctx: &LoadContext) -> Result<Box<T>, PersistError> {
        let ctor = self
            .constructors
            .get(bundle.class_name())
            .ok_or_else(|| PersistError::UnknownClass(bundle.class_name().to_string()))?;
        ctor(bundle, ctx)
    }

    fn is_registered(&self, class_name: &str) -> bool {
        self.constructors.contains_key(class_name)
    }
}
