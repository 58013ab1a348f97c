// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A remote handle to a process known only by PID, driven entirely
//! through a [`Communicator`] — no direct reference to the process
//! itself, since it may be running in another task, thread, or host.

use std::sync::Arc;

use corral_comms::{
    BroadcastMessage, Communicator, RpcIntent, RpcMessage, RpcOutcome, CONTROL_KILL_SUBJECT,
    CONTROL_PAUSE_SUBJECT, CONTROL_PLAY_SUBJECT,
};
use corral_core::Pid;
use serde_json::Value;

use crate::error::LaunchError;

pub struct RemoteProcessController {
    communicator: Arc<dyn Communicator>,
}

impl RemoteProcessController {
    pub fn new(communicator: Arc<dyn Communicator>) -> Self {
        Self { communicator }
    }

    async fn send(&self, message: RpcMessage) -> Result<Value, LaunchError> {
        let reply = self.communicator.rpc_send(message).await?;
        match reply.outcome {
            RpcOutcome::Ok { body } => Ok(body),
            RpcOutcome::Error { message } => Err(LaunchError::TaskRejected(message)),
        }
    }

    pub async fn play(&self, pid: Pid) -> Result<Value, LaunchError> {
        self.send(RpcMessage::new(pid, RpcIntent::Play)).await
    }

    pub async fn pause(&self, pid: Pid, message: Option<String>) -> Result<Value, LaunchError> {
        let mut msg = RpcMessage::new(pid, RpcIntent::Pause);
        if let Some(m) = message {
            msg = msg.with_message(m);
        }
        self.send(msg).await
    }

    pub async fn kill(&self, pid: Pid, message: Option<String>) -> Result<Value, LaunchError> {
        let mut msg = RpcMessage::new(pid, RpcIntent::Kill);
        if let Some(m) = message {
            msg = msg.with_message(m);
        }
        self.send(msg).await
    }

    pub async fn status(&self, pid: Pid) -> Result<Value, LaunchError> {
        self.send(RpcMessage::new(pid, RpcIntent::Status)).await
    }

    /// Fire-and-forget fleet-wide broadcasts: every attached process
    /// reacts independently, with no per-process reply.
    pub fn play_all(&self) {
        self.communicator.broadcast_send(BroadcastMessage::new(CONTROL_PLAY_SUBJECT));
    }

    pub fn pause_all(&self) {
        self.communicator.broadcast_send(BroadcastMessage::new(CONTROL_PAUSE_SUBJECT));
    }

    pub fn kill_all(&self) {
        self.communicator.broadcast_send(BroadcastMessage::new(CONTROL_KILL_SUBJECT));
    }
}
