// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `corral add` command handler

use std::sync::Arc;

use anyhow::{anyhow, Result};
use corral_launcher::{LaunchArgs, ProcessLauncher};
use corral_process::test_support::ArithmeticAdder;
use corral_process::ProcessBehavior;

pub async fn run(a: i64, b: i64) -> Result<()> {
    let launcher: ProcessLauncher<ArithmeticAdder> =
        ProcessLauncher::new(Arc::new(|_args, _kwargs| Ok(ArithmeticAdder)));

    let reply = launcher
        .launch(LaunchArgs {
            process_class_id: ArithmeticAdder::CLASS_NAME.to_string(),
            init_args: serde_json::json!({"a": a, "b": b}),
            init_kwargs: serde_json::Value::Null,
            persist: false,
            nowait: false,
        })
        .await?;

    let terminal = reply.terminal.ok_or_else(|| anyhow!("launch without nowait must terminate"))?;
    println!("{}", serde_json::to_string_pretty(&terminal)?);
    Ok(())
}
