// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A shared demo [`ProcessBehavior`] used by the workspace's seed
//! scenario tests, shipped behind `test-support` so downstream crates
//! (and the root integration tests) don't each need their own toy
//! process to exercise the control surface.

use async_trait::async_trait;
use corral_persistence::{Bundle, LoadContext, PersistError, SaveContext, Savable};
use serde_json::Value;

use crate::behavior::{ProcessBehavior, StepContext};
use crate::command::{StepCommand, StepOutcome};
use crate::spec::{Port, ProcessSpec};

/// `add(a, b)` — stops immediately with `a + b`.
pub struct ArithmeticAdder;

#[async_trait]
impl ProcessBehavior for ArithmeticAdder {
    const CLASS_NAME: &'static str = "corral.test_support.ArithmeticAdder";

    fn spec(&self) -> ProcessSpec {
        ProcessSpec::new()
            .with_input(Port::new("a").required())
            .with_input(Port::new("b").required())
    }

    fn initial_step(&self) -> &str {
        "add"
    }

    async fn call_step(&self, step: &str, args: Value, _ctx: &StepContext) -> StepOutcome {
        match step {
            "add" => {
                let a = args.get("a").and_then(Value::as_i64).unwrap_or(0);
                let b = args.get("b").and_then(Value::as_i64).unwrap_or(0);
                StepOutcome::Command(StepCommand::stopped_with(serde_json::json!(a + b)))
            }
            other => StepOutcome::Failed(format!("unknown step {other:?}")),
        }
    }
}

impl Savable for ArithmeticAdder {
    const CLASS_NAME: &'static str = "corral.test_support.ArithmeticAdder";

    fn save(&self, _ctx: &SaveContext) -> Bundle {
        Bundle::new(Self::CLASS_NAME)
    }

    fn load(bundle: &Bundle, _ctx: &LoadContext) -> Result<Self, PersistError> {
        Self::check_class(bundle)?;
        Ok(ArithmeticAdder)
    }
}

/// `announce` waits with `message`, then `resume(value)` stops with
/// `value` unchanged. Used for the wait/resume and kill-while-waiting
/// seed scenarios.
pub struct ArithmeticWaiter {
    pub message: String,
}

#[async_trait]
impl ProcessBehavior for ArithmeticWaiter {
    const CLASS_NAME: &'static str = "corral.test_support.ArithmeticWaiter";

    fn initial_step(&self) -> &str {
        "announce"
    }

    async fn call_step(&self, step: &str, args: Value, _ctx: &StepContext) -> StepOutcome {
        match step {
            "announce" => StepOutcome::Command(StepCommand::Wait {
                resume_step: Some("settle".to_string()),
                message: Some(self.message.clone()),
                data: None,
            }),
            "settle" => StepOutcome::Command(StepCommand::stopped_with(args)),
            other => StepOutcome::Failed(format!("unknown step {other:?}")),
        }
    }
}

impl Savable for ArithmeticWaiter {
    const CLASS_NAME: &'static str = "corral.test_support.ArithmeticWaiter";

    fn save(&self, _ctx: &SaveContext) -> Bundle {
        let mut bundle = Bundle::new(Self::CLASS_NAME);
        bundle.set_value("message", &self.message).expect("message serializes");
        bundle
    }

    fn load(bundle: &Bundle, _ctx: &LoadContext) -> Result<Self, PersistError> {
        Self::check_class(bundle)?;
        Ok(ArithmeticWaiter { message: bundle.get_value("message")? })
    }
}
