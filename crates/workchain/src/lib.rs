// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! corral-workchain: a compiled outline tree, its cursor-carrying
//! stepper, and the `ProcessBehavior` that drives a process through it.

mod error;
mod outline;
mod predicate;
mod stepper;
mod workchain;

pub use error::WorkChainError;
pub use outline::{if_then, return_now, sequence, step, while_loop, Instruction, Outline};
pub use predicate::{Predicate, PredicateRegistry};
pub use stepper::{Cursor, StepperOutcome};
pub use workchain::{StepFn, WorkChainBehavior, WorkChainDefinition};
