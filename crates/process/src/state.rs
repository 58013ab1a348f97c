// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The process state machine: what each state holds, and how it
//! advances to the next one.

use std::sync::Arc;

use corral_core::StateLabel;
use serde_json::Value;
use tokio::sync::{oneshot, watch};

use crate::behavior::ProcessBehavior;
use crate::command::{Interruption, StepCommand, StepOutcome, WaitOutcome};

/// The data carried by each point in a process's lifecycle. This is the
/// persisted shape; the channels that drive execution (the interruption
/// watch, a waiting state's completion oneshot) live alongside it in
/// `Process`, not here, since they can't be serialized and are rebuilt
/// fresh on load.
#[derive(Debug, Clone)]
pub enum ProcessState {
    Created,
    Running { step: String, args: Value },
    Waiting { resume_step: Option<String>, message: Option<String>, data: Option<Value> },
    Finished { result: Value, successful: bool },
    Excepted { message: String },
    Killed { message: Option<String> },
}

impl ProcessState {
    pub fn label(&self) -> StateLabel {
        match self {
            Self::Created => StateLabel::Created,
            Self::Running { .. } => StateLabel::Running,
            Self::Waiting { .. } => StateLabel::Waiting,
            Self::Finished { .. } => StateLabel::Finished,
            Self::Excepted { .. } => StateLabel::Excepted,
            Self::Killed { .. } => StateLabel::Killed,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.label().is_terminal()
    }

    /// Advance this state by one unit of work: run a step to completion
    /// (or until interrupted), or wait for a resume/interruption.
    ///
    /// `waiter` must be `Some` when `self` is `Waiting`; the executor
    /// loop is responsible for creating the oneshot and registering its
    /// sender with the process before calling this.
    pub async fn execute<B: ProcessBehavior>(
        self,
        behavior: Arc<B>,
        mut interruption: watch::Receiver<Option<Interruption>>,
        waiter: Option<oneshot::Receiver<WaitOutcome>>,
    ) -> ExecuteOutcome {
        match self {
            Self::Running { step, args } => {
                let step_for_task = step.clone();
                let args_for_task = args.clone();
                let interruption_for_ctx = interruption.clone();
                let behavior_for_task = Arc::clone(&behavior);
                let task = tokio::spawn(async move {
                    let ctx = crate::behavior::StepContext::new(interruption_for_ctx);
                    behavior_for_task.call_step(&step_for_task, args_for_task, &ctx).await
                });
                tokio::pin!(task);
                loop {
                    tokio::select! {
                        joined = &mut task => {
                            let outcome = match joined {
                                Ok(o) => o,
                                Err(join_err) => StepOutcome::Failed(format!(
                                    "step {step:?} panicked: {join_err}"
                                )),
                            };
                            return ExecuteOutcome::from_step_outcome(outcome);
                        }
                        changed = interruption.changed() => {
                            if changed.is_err() {
                                continue;
                            }
                            if let Some(i) = interruption.borrow().clone() {
                                // The step itself is left to run to completion in
                                // the background; only entry into whatever state
                                // it would have produced is deferred. Its result
                                // is never awaited here and never applied — the
                                // interrupt's own outcome takes precedence, and a
                                // resumed process simply re-runs the step fresh.
                                return ExecuteOutcome::Interrupted(
                                    i,
                                    Self::Running { step, args },
                                );
                            }
                        }
                    }
                }
            }
            Self::Waiting { resume_step, message, data } => {
                let mut waiter = waiter.expect("Waiting state requires a registered waiter");
                loop {
                    tokio::select! {
                        resolved = &mut waiter => {
                            return match resolved {
                                Ok(WaitOutcome::Resumed(value)) => {
                                    let next_step = resume_step
                                        .clone()
                                        .unwrap_or_else(|| "resume".to_string());
                                    ExecuteOutcome::Transition(Self::Running {
                                        step: next_step,
                                        args: value.unwrap_or(Value::Null),
                                    })
                                }
                                Ok(WaitOutcome::Interrupted(i)) => ExecuteOutcome::Interrupted(
                                    i,
                                    Self::Waiting { resume_step, message, data },
                                ),
                                Err(_) => ExecuteOutcome::Interrupted(
                                    Interruption::Kill(Some(
                                        "waiting process's completion handle was dropped".into(),
                                    )),
                                    Self::Waiting { resume_step, message, data },
                                ),
                            };
                        }
                        changed = interruption.changed() => {
                            if changed.is_err() {
                                continue;
                            }
                            if let Some(i) = interruption.borrow().clone() {
                                return ExecuteOutcome::Interrupted(
                                    i,
                                    Self::Waiting { resume_step, message, data },
                                );
                            }
                        }
                    }
                }
            }
            other => ExecuteOutcome::Transition(other),
        }
    }
}

/// What one round of `execute()` produced.
#[derive(Debug)]
pub enum ExecuteOutcome {
    /// The process settled into a new state and execution should
    /// continue the loop immediately.
    Transition(ProcessState),
    /// A pause or kill request preempted the in-flight step or wait,
    /// carrying back the state to resume from once the interrupt is
    /// handled (a pause resumes it verbatim; a kill discards it).
    Interrupted(Interruption, ProcessState),
}

impl ExecuteOutcome {
    fn from_step_outcome(outcome: StepOutcome) -> Self {
        match outcome {
            StepOutcome::Command(StepCommand::Continue { next_step, args }) => {
                Self::Transition(ProcessState::Running { step: next_step, args })
            }
            StepOutcome::Command(StepCommand::Wait { resume_step, message, data }) => {
                Self::Transition(ProcessState::Waiting { resume_step, message, data })
            }
            StepOutcome::Command(StepCommand::Stop { result, successful }) => {
                Self::Transition(ProcessState::Finished { result, successful })
            }
            StepOutcome::Command(StepCommand::Kill { message }) => {
                Self::Transition(ProcessState::Killed { message })
            }
            StepOutcome::Failed(message) => Self::Transition(ProcessState::Excepted { message }),
        }
    }
}
