// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `corral pause-resume-demo` — launches a waiting process, pauses it
//! and plays it back over a communicator, then resumes it to
//! completion. A smoke test for the control surface end to end.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use corral_comms::{Communicator, LocalCommunicator, RpcIntent, RpcMessage};
use corral_core::StateLabel;
use corral_process::test_support::ArithmeticWaiter;
use corral_process::Process;

pub async fn run() -> Result<()> {
    let comm: Arc<dyn Communicator> =
        Arc::new(LocalCommunicator::new());
    let process = Process::new(
        ArithmeticWaiter { message: "waiting for the word".to_string() },
        serde_json::Value::Null,
    )
    .map_err(|e| anyhow!(e))?;
    corral_comms::attach(Arc::clone(&process), Arc::clone(&comm));
    process.start();

    let mut labels = process.subscribe_label();
    while *labels.borrow() != StateLabel::Waiting {
        labels.changed().await?;
    }
    println!("process {} is waiting", process.pid());

    comm.rpc_send(RpcMessage::new(process.pid(), RpcIntent::Pause)).await?;
    println!("paused: {}", process.is_paused());

    comm.rpc_send(RpcMessage::new(process.pid(), RpcIntent::Play)).await?;
    println!("resumed play: {}", !process.is_paused());

    loop {
        if process.resume(Some(serde_json::json!("go"))).is_ok() {
            break;
        }
        tokio::task::yield_now().await;
    }
    let terminal = process.wait_terminal().await;
    println!("{}", serde_json::to_string_pretty(&terminal)?);
    Ok(())
}
