// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::label::StateLabel;

/// Proptest strategies for core state machine types.
pub mod strategies {
    use super::StateLabel;
    use proptest::prelude::*;

    pub fn arb_state_label() -> impl Strategy<Value = StateLabel> {
        prop_oneof![
            Just(StateLabel::Created),
            Just(StateLabel::Running),
            Just(StateLabel::Waiting),
            Just(StateLabel::Finished),
            Just(StateLabel::Excepted),
            Just(StateLabel::Killed),
        ]
    }

    pub fn arb_non_terminal_label() -> impl Strategy<Value = StateLabel> {
        prop_oneof![
            Just(StateLabel::Created),
            Just(StateLabel::Running),
            Just(StateLabel::Waiting),
        ]
    }
}

/// A fixed PID for deterministic fixtures, derived from a small integer
/// so tests reading failure output can tell instances apart at a glance.
pub fn fixture_pid(seed: u128) -> crate::Pid {
    crate::Pid(uuid::Uuid::from_u128(seed))
}
