// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`WorkChainBehavior`]: a [`ProcessBehavior`] whose steps are driven
//! by an [`Outline`] instead of being hand-written one at a time.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use corral_persistence::{Bundle, LoadContext, PersistError, SaveContext, Savable};
use corral_process::{ProcessBehavior, StepCommand, StepContext, StepOutcome};
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::WorkChainError;
use crate::outline::Outline;
use crate::predicate::PredicateRegistry;
use crate::stepper::{Cursor, StepperOutcome};

/// A registered step: takes the value the previous step (or the
/// process's raw inputs) produced, returns the value it hands to
/// whichever leaf the outline selects next.
pub type StepFn = Arc<dyn Fn(Value) -> Pin<Box<dyn Future<Output = Value> + Send>> + Send + Sync>;

/// Everything needed to run a workchain but not to persist it: the
/// compiled tree, its step functions, and its predicates. Stashed in a
/// [`LoadContext`] extension so [`WorkChainBehavior::load`] can
/// rehydrate a bundle that only carries the cursor.
#[derive(Clone)]
pub struct WorkChainDefinition {
    pub outline: Arc<Outline>,
    pub steps: Arc<HashMap<String, StepFn>>,
    pub predicates: Arc<PredicateRegistry>,
}

impl WorkChainDefinition {
    pub fn new(outline: Outline, steps: HashMap<String, StepFn>, predicates: PredicateRegistry) -> Self {
        Self { outline: Arc::new(outline), steps: Arc::new(steps), predicates: Arc::new(predicates) }
    }
}

pub struct WorkChainBehavior {
    definition: WorkChainDefinition,
    initial_leaf: String,
    cursor: Mutex<Cursor>,
}

impl WorkChainBehavior {
    pub fn new(definition: WorkChainDefinition) -> Result<Self, WorkChainError> {
        let (cursor, outcome) = definition.outline.start(&definition.predicates, &Value::Null);
        let initial_leaf = match outcome {
            StepperOutcome::Active(name) => name,
            StepperOutcome::Finished => return Err(WorkChainError::EmptyOutline),
        };
        Ok(Self { definition, initial_leaf, cursor: Mutex::new(cursor) })
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor.lock().clone()
    }
}

#[async_trait]
impl ProcessBehavior for WorkChainBehavior {
    const CLASS_NAME: &'static str = "corral.workchain.WorkChain";

    fn initial_step(&self) -> &str {
        &self.initial_leaf
    }

    async fn call_step(&self, step: &str, args: Value, _ctx: &StepContext) -> StepOutcome {
        let Some(function) = self.definition.steps.get(step) else {
            return StepOutcome::Failed(WorkChainError::UnknownStep(step.to_string()).to_string());
        };
        let output = function(args).await;

        let next_cursor;
        let outcome;
        {
            let cursor = self.cursor.lock();
            let (c, o) = self.definition.outline.advance(&cursor, &self.definition.predicates, &output);
            next_cursor = c;
            outcome = o;
        }
        *self.cursor.lock() = next_cursor;

        match outcome {
            StepperOutcome::Active(next_step) => {
                tracing::debug!(step, next_step, "workchain advancing");
                StepOutcome::Command(StepCommand::Continue { next_step, args: output })
            }
            StepperOutcome::Finished => {
                tracing::debug!(step, "workchain finished");
                StepOutcome::Command(StepCommand::stopped_with(output))
            }
        }
    }
}

impl Savable for WorkChainBehavior {
    const CLASS_NAME: &'static str = "corral.workchain.WorkChainBehavior";

    fn save(&self, _ctx: &SaveContext) -> Bundle {
        let mut bundle = Bundle::new(Self::CLASS_NAME);
        bundle.set_value("cursor", self.cursor()).expect("cursor serializes");
        bundle
    }

    /// Requires a [`WorkChainDefinition`] stashed in `ctx`'s extensions
    /// (the outline and its step/predicate functions are not
    /// themselves serializable).
    fn load(bundle: &Bundle, ctx: &LoadContext) -> Result<Self, PersistError> {
        Self::check_class(bundle)?;
        let definition = ctx.extensions.get::<WorkChainDefinition>().ok_or_else(|| {
            PersistError::Other(
                "WorkChainBehavior::load needs a WorkChainDefinition in LoadContext".to_string(),
            )
        })?;
        let cursor: Cursor = bundle.get_value("cursor")?;
        let initial_leaf = definition
            .outline
            .current_step(&cursor)
            .ok_or_else(|| PersistError::Other("cursor names no live step".to_string()))?
            .to_string();
        Ok(Self {
            definition: (*definition).clone(),
            initial_leaf,
            cursor: Mutex::new(cursor),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::{if_then, sequence, step};
    use corral_process::Process;

    fn counting_step(calls: Arc<std::sync::atomic::AtomicUsize>) -> StepFn {
        Arc::new(move |value: Value| {
            let calls = Arc::clone(&calls);
            Box::pin(async move {
                calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                value
            })
        })
    }

    fn demo_definition() -> (WorkChainDefinition, Arc<std::sync::atomic::AtomicUsize>) {
        let outline = Outline::new(sequence(vec![
            step("step_a"),
            if_then(
                vec![("cond".to_string(), step("step_b"))],
                Some(step("step_c")),
            ),
            step("step_d"),
        ]));
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let mut steps: HashMap<String, StepFn> = HashMap::new();
        for name in ["step_a", "step_b", "step_c", "step_d"] {
            steps.insert(name.to_string(), counting_step(Arc::clone(&calls)));
        }
        let mut predicates = PredicateRegistry::new();
        predicates.register("cond", Arc::new(|_: &Value| false));
        (WorkChainDefinition::new(outline, steps, predicates), calls)
    }

    #[tokio::test]
    async fn s9_workchain_runs_through_the_else_branch_and_finishes() {
        let (definition, calls) = demo_definition();
        let behavior = WorkChainBehavior::new(definition).unwrap();
        let process = Process::new(behavior, Value::Null).unwrap();
        process.start();
        let terminal = process.wait_terminal().await;
        assert!(terminal.is_successful());
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[test]
    fn rejects_an_outline_with_no_reachable_step() {
        let outline = Outline::new(crate::outline::return_now());
        let definition =
            WorkChainDefinition::new(outline, HashMap::new(), PredicateRegistry::new());
        assert!(matches!(WorkChainBehavior::new(definition), Err(WorkChainError::EmptyOutline)));
    }
}
