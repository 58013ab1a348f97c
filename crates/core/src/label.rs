// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle state labels shared across the process, persistence and
//! communicator layers (e.g. to build `state_changed.{from}.{to}` subjects).

use serde::{Deserialize, Serialize};
use std::fmt;

/// The tag half of a [`crate::StateLabel`]-carrying lifecycle state, without
/// the state-specific payload. Mirrors the variants of the process state
/// machine's sum type one level up so non-`corral-process` crates can reason
/// about transitions without depending on the full state values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateLabel {
    Created,
    Running,
    Waiting,
    Finished,
    Excepted,
    Killed,
}

impl StateLabel {
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Excepted | Self::Killed)
    }

    /// The labels this state is allowed to transition into, per the
    /// lifecycle graph.
    pub fn allowed_next(self) -> &'static [StateLabel] {
        use StateLabel::*;
        match self {
            Created => &[Running, Killed, Excepted],
            Running => &[Running, Waiting, Finished, Killed, Excepted],
            Waiting => &[Running, Waiting, Killed, Excepted, Finished],
            Finished | Excepted | Killed => &[],
        }
    }

    pub fn can_transition_to(self, next: StateLabel) -> bool {
        self.allowed_next().contains(&next)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Waiting => "waiting",
            Self::Finished => "finished",
            Self::Excepted => "excepted",
            Self::Killed => "killed",
        }
    }
}

impl fmt::Display for StateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
