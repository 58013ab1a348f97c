// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persister contract: store/load/enumerate/delete bundles keyed by
//! `(pid, tag)`.

use crate::error::StorageError;
use corral_core::Pid;
use corral_persistence::Bundle;

/// A `(pid, tag?)`-addressed checkpoint record. `tag` lets multiple
/// checkpoints coexist for the same pid.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CheckpointRecord {
    pub pid: Pid,
    pub tag: Option<String>,
}

/// Storage backend for bundles.
///
/// Implementations are expected to be thread-safe only at whole-operation
/// granularity: callers must not interleave partial reads of a single
/// checkpoint across threads.
pub trait Persister: Send + Sync {
    fn save_checkpoint(
        &self,
        pid: Pid,
        tag: Option<&str>,
        bundle: &Bundle,
    ) -> Result<(), StorageError>;

    fn load_checkpoint(&self, pid: Pid, tag: Option<&str>) -> Result<Bundle, StorageError>;

    fn get_checkpoints(&self) -> Result<Vec<CheckpointRecord>, StorageError>;

    fn get_process_checkpoints(&self, pid: Pid) -> Result<Vec<CheckpointRecord>, StorageError>;

    /// Never errors when the checkpoint is already absent.
    fn delete_checkpoint(&self, pid: Pid, tag: Option<&str>) -> Result<(), StorageError>;

    fn delete_process_checkpoints(&self, pid: Pid) -> Result<(), StorageError>;
}
