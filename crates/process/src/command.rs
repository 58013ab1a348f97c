// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step commands, interruptions, and the outcomes they settle into.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The return value of a step, interpreted by the step executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepCommand {
    /// Transition to another `Running` on `next_step`.
    Continue { next_step: String, args: Value },
    /// Transition to `Waiting`.
    Wait {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        resume_step: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<Value>,
    },
    /// Transition to `Finished`.
    Stop { result: Value, successful: bool },
    /// Transition to `Killed`.
    Kill {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl StepCommand {
    /// A step returning a plain value is treated as `Stop { value, successful: true }`.
    pub fn stopped_with(value: Value) -> Self {
        Self::Stop { result: value, successful: true }
    }

    /// A step raising a typed "unsuccessful result" is `Stop { value, successful: false }`.
    pub fn unsuccessful(value: Value) -> Self {
        Self::Stop { result: value, successful: false }
    }
}

/// A first-class event requesting pause or kill of the currently
/// executing step, used in place of unwinding the stack with an
/// exception.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Interruption {
    Pause(Option<String>),
    Kill(Option<String>),
}

/// What a step invocation ultimately produced. Any panic inside user step
/// code is caught at this boundary and translated to `Excepted`
/// (`Failed`), never allowed to unwind past the executor.
#[derive(Debug)]
pub enum StepOutcome {
    Command(StepCommand),
    Failed(String),
}

/// The result of awaiting a `Waiting` state's waiting-future: either a
/// resume value, or an interruption that requires a fresh waiting-future
/// to be built before re-raising.
#[derive(Debug, Clone)]
pub enum WaitOutcome {
    Resumed(Option<Value>),
    Interrupted(Interruption),
}

/// What a process's terminal future ultimately settles with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TerminalOutcome {
    Finished { result: Value, successful: bool },
    Excepted { message: String },
    Killed { message: Option<String> },
}

impl TerminalOutcome {
    pub fn is_successful(&self) -> bool {
        matches!(self, Self::Finished { successful: true, .. })
    }
}

/// What a control operation that scheduled an interrupt action eventually
/// resolves to, once the step executor actually applies it.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlOutcome {
    Paused,
    Killed,
    /// The pending pause was cancelled by a `play()` before it fired.
    Cancelled,
    /// The process was already terminal; the call was a no-op.
    NoOp,
}
