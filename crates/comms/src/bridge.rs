// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires a live [`Process`] to a [`Communicator`]: RPC intents become
//! control-surface calls, and every state transition becomes a
//! `state_changed.{from}.{to}` broadcast.

use std::sync::Arc;

use corral_core::Clock;
use corral_process::{Process, ProcessBehavior, ProcessEvent};

use crate::communicator::Communicator;
use crate::message::{state_changed_subject, BroadcastMessage, RpcOutcome, RpcReply};

/// Register `process` with `communicator`: an RPC subscriber under its
/// PID, and a broadcast listener for its state changes. Returns the
/// RPC subscription id (the process's PID as a string), which the
/// caller can later pass to [`Communicator::remove_rpc_subscriber`].
pub fn attach<B, C>(process: Arc<Process<B, C>>, communicator: Arc<dyn Communicator>) -> String
where
    B: ProcessBehavior,
    C: Clock,
{
    let pid = process.pid();
    let broadcaster = Arc::clone(&communicator);
    process.events().register_named("corral.comms.bridge", move |event| {
        if let ProcessEvent::StateChanged { from, to, .. } = event {
            broadcaster.broadcast_send(BroadcastMessage {
                subject: state_changed_subject(*from, *to),
                sender: Some(pid),
                correlation_id: None,
                body: None,
            });
        }
    });

    // Fleet-wide `pause_all`/`play_all`/`kill_all` are fire-and-forget
    // broadcasts on well-known subjects; every attached process reacts
    // independently, with no per-reply correlation.
    let fleet_process = Arc::clone(&process);
    communicator.add_broadcast_subscriber(
        None,
        Arc::new(move |message| {
            let process = Arc::clone(&fleet_process);
            match message.subject.as_str() {
                crate::message::CONTROL_PLAY_SUBJECT => {
                    tokio::spawn(async move {
                        let _ = process.play().await;
                    });
                }
                crate::message::CONTROL_PAUSE_SUBJECT => {
                    tokio::spawn(async move {
                        let _ = process.pause(None).await;
                    });
                }
                crate::message::CONTROL_KILL_SUBJECT => {
                    tokio::spawn(async move {
                        let _ = process.kill(None).await;
                    });
                }
                _ => {}
            }
        }),
    );

    let rpc_process = Arc::clone(&process);
    communicator.add_rpc_subscriber(
        pid.to_string(),
        Arc::new(move |message| {
            let process = Arc::clone(&rpc_process);
            Box::pin(async move {
                use crate::message::RpcIntent;
                let outcome = match message.intent {
                    RpcIntent::Play => match process.play().await {
                        Ok(started) => RpcOutcome::Ok { body: serde_json::json!(started) },
                        Err(e) => RpcOutcome::Error { message: e.to_string() },
                    },
                    RpcIntent::Pause => match process.pause(message.message.clone()).await {
                        Ok(outcome) => RpcOutcome::Ok { body: serde_json::json!(format!("{outcome:?}")) },
                        Err(e) => RpcOutcome::Error { message: e.to_string() },
                    },
                    RpcIntent::Kill => match process.kill(message.message.clone()).await {
                        Ok(outcome) => RpcOutcome::Ok { body: serde_json::json!(format!("{outcome:?}")) },
                        Err(e) => RpcOutcome::Error { message: e.to_string() },
                    },
                    RpcIntent::Status => RpcOutcome::Ok {
                        body: serde_json::json!({
                            "label": process.label().to_string(),
                            "paused": process.is_paused(),
                            "status": process.status(),
                        }),
                    },
                };
                RpcReply { correlation_id: message.correlation_id, outcome }
            })
        }),
    )
}
