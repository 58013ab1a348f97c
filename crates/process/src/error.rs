// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-level error taxonomy.

use corral_core::{Pid, StateLabel};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("operation not legal for {pid} in state {state}")]
    InvalidState { pid: Pid, state: StateLabel },

    #[error("illegal transition for {pid}: {from} -> {to}")]
    IllegalTransition { pid: Pid, from: StateLabel, to: StateLabel },

    #[error("{pid} is closed")]
    Closed { pid: Pid },

    #[error(transparent)]
    Persist(#[from] corral_persistence::PersistError),
}
