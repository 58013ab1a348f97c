// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! An in-memory [`Persister`], required for tests and provided as library
//! code (rather than only inline in `#[cfg(test)]`) so downstream crates
//! can use it in their own test suites.

use crate::error::StorageError;
use crate::persister::{CheckpointRecord, Persister};
use corral_core::Pid;
use corral_persistence::Bundle;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Keyed `pid -> (tag -> bundle)`, matching the reference in-memory
/// persister's shape.
#[derive(Default)]
pub struct InMemoryPersister {
    checkpoints: Mutex<HashMap<Pid, HashMap<Option<String>, Bundle>>>,
}

impl InMemoryPersister {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Persister for InMemoryPersister {
    fn save_checkpoint(
        &self,
        pid: Pid,
        tag: Option<&str>,
        bundle: &Bundle,
    ) -> Result<(), StorageError> {
        self.checkpoints
            .lock()
            .entry(pid)
            .or_default()
            .insert(tag.map(str::to_string), bundle.clone());
        Ok(())
    }

    fn load_checkpoint(&self, pid: Pid, tag: Option<&str>) -> Result<Bundle, StorageError> {
        self.checkpoints
            .lock()
            .get(&pid)
            .and_then(|by_tag| by_tag.get(&tag.map(str::to_string)))
            .cloned()
            .ok_or(StorageError::NotFound { pid, tag: tag.map(str::to_string) })
    }

    fn get_checkpoints(&self) -> Result<Vec<CheckpointRecord>, StorageError> {
        let guard = self.checkpoints.lock();
        Ok(guard
            .iter()
            .flat_map(|(pid, by_tag)| {
                by_tag.keys().map(|tag| CheckpointRecord { pid: *pid, tag: tag.clone() })
            })
            .collect())
    }

    fn get_process_checkpoints(&self, pid: Pid) -> Result<Vec<CheckpointRecord>, StorageError> {
        let guard = self.checkpoints.lock();
        Ok(guard
            .get(&pid)
            .map(|by_tag| {
                by_tag.keys().map(|tag| CheckpointRecord { pid, tag: tag.clone() }).collect()
            })
            .unwrap_or_default())
    }

    fn delete_checkpoint(&self, pid: Pid, tag: Option<&str>) -> Result<(), StorageError> {
        if let Some(by_tag) = self.checkpoints.lock().get_mut(&pid) {
            by_tag.remove(&tag.map(str::to_string));
        }
        Ok(())
    }

    fn delete_process_checkpoints(&self, pid: Pid) -> Result<(), StorageError> {
        self.checkpoints.lock().remove(&pid);
        Ok(())
    }
}
