// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Launcher error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("task rejected: {0}")]
    TaskRejected(String),

    #[error(transparent)]
    Persist(#[from] corral_persistence::PersistError),

    #[error(transparent)]
    Storage(#[from] corral_storage::StorageError),

    #[error(transparent)]
    Process(#[from] corral_process::ProcessError),

    #[error(transparent)]
    Comm(#[from] corral_comms::CommError),

    #[error("process terminated unsuccessfully: {0}")]
    Unsuccessful(String),
}
