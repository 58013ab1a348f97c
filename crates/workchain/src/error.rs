// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workchain error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkChainError {
    #[error("outline has no reachable step")]
    EmptyOutline,

    #[error("no step function registered for {0:?}")]
    UnknownStep(String),

    #[error(transparent)]
    Persist(#[from] corral_persistence::PersistError),
}
