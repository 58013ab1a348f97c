// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Named predicates evaluated against a workchain's running context,
//! the way [`crate::outline::Instruction::If`]/`While` nodes reference
//! their guards.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

pub type Predicate = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

#[derive(Clone, Default)]
pub struct PredicateRegistry(HashMap<String, Predicate>);

impl PredicateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, predicate: Predicate) -> &mut Self {
        self.0.insert(name.into(), predicate);
        self
    }

    pub(crate) fn eval(&self, name: &str, state: &Value) -> bool {
        match self.0.get(name) {
            Some(predicate) => predicate(state),
            None => {
                tracing::warn!(predicate = %name, "unknown predicate, defaulting to false");
                false
            }
        }
    }
}

impl std::fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredicateRegistry").field("registered", &self.0.len()).finish()
    }
}
