// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! corral-process: the process state machine, step executor, control
//! surface and the `Process<B>` object itself.

mod behavior;
mod command;
mod error;
mod event;
mod persistence;
mod process;
mod spec;
mod state;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use behavior::{ProcessBehavior, StepContext};
pub use command::{
    ControlOutcome, Interruption, StepCommand, StepOutcome, TerminalOutcome, WaitOutcome,
};
pub use error::ProcessError;
pub use event::{EventTable, ProcessEvent};
pub use process::Process;
pub use spec::{Port, ProcessSpec};
pub use state::{ExecuteOutcome, ProcessState};
