// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The user-supplied behavior a [`crate::Process`] drives.

use async_trait::async_trait;
use serde_json::Value;

use crate::command::StepOutcome;
use crate::spec::ProcessSpec;

/// Handed to a step on every invocation. `interruption()` lets
/// long-running steps poll for a pending pause/kill between units of
/// work without the executor having to abort the step task outright.
pub struct StepContext {
    interruption: tokio::sync::watch::Receiver<Option<crate::command::Interruption>>,
}

impl StepContext {
    pub(crate) fn new(
        interruption: tokio::sync::watch::Receiver<Option<crate::command::Interruption>>,
    ) -> Self {
        Self { interruption }
    }

    /// A step that wants to cooperate with pause/kill requests can check
    /// this between units of work instead of running to completion.
    pub fn pending_interruption(&self) -> Option<crate::command::Interruption> {
        self.interruption.borrow().clone()
    }
}

/// The behavior a process executes: a named dispatch table of steps plus
/// lifecycle hooks fired as the process's state changes.
///
/// `CLASS_NAME` identifies the concrete behavior type for persistence,
/// mirroring [`corral_persistence::Savable::CLASS_NAME`].
#[async_trait]
pub trait ProcessBehavior: Send + Sync + 'static {
    const CLASS_NAME: &'static str;

    /// The input/output contract this behavior declares.
    fn spec(&self) -> ProcessSpec {
        ProcessSpec::new()
    }

    /// The name of the step to run first, after `Created` accepts its
    /// pre-processed inputs.
    fn initial_step(&self) -> &str;

    /// Invoke the named step with `args`, producing a [`StepOutcome`].
    /// A panic inside this call is caught by the executor and converted
    /// to `StepOutcome::Failed`; implementations need not guard against
    /// panicking themselves.
    async fn call_step(&self, step: &str, args: Value, ctx: &StepContext) -> StepOutcome;

    /// Fired once when the process enters `Running` for the first time.
    async fn on_create(&self) {}

    /// Fired on every entry into `Running`.
    async fn on_running(&self, _step: &str) {}

    /// Fired on every entry into `Waiting`.
    async fn on_waiting(&self, _message: Option<&str>) {}

    /// Fired once, when the process reaches `Finished`.
    async fn on_finished(&self, _result: &Value, _successful: bool) {}

    /// Fired once, when the process reaches `Excepted`.
    async fn on_excepted(&self, _message: &str) {}

    /// Fired once, when the process reaches `Killed`.
    async fn on_killed(&self, _message: Option<&str>) {}
}
