// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `corral workchain` command handler — a fixed demo outline, run to
//! completion.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use corral_process::Process;
use corral_workchain::{if_then, sequence, step, Outline, PredicateRegistry, StepFn, WorkChainBehavior, WorkChainDefinition};
use serde_json::Value;

fn tracing_step(name: &'static str) -> StepFn {
    Arc::new(move |value: Value| {
        Box::pin(async move {
            println!("ran {name} with {value}");
            value
        })
    })
}

pub async fn run() -> Result<()> {
    let outline = Outline::new(sequence(vec![
        step("step_a"),
        if_then(vec![("cond".to_string(), step("step_b"))], Some(step("step_c"))),
        step("step_d"),
    ]));

    let mut steps: HashMap<String, StepFn> = HashMap::new();
    for name in ["step_a", "step_b", "step_c", "step_d"] {
        steps.insert(name.to_string(), tracing_step(name));
    }
    let mut predicates = PredicateRegistry::new();
    predicates.register("cond", Arc::new(|_: &Value| false));

    let definition = WorkChainDefinition::new(outline, steps, predicates);
    let behavior = WorkChainBehavior::new(definition)?;
    let process = Process::new(behavior, Value::Null).map_err(|e| anyhow!(e))?;
    process.start();
    let terminal = process.wait_terminal().await;
    println!("{}", serde_json::to_string_pretty(&terminal)?);
    Ok(())
}
