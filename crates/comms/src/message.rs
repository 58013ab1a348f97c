// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RPC and broadcast message shapes carried over a [`crate::Communicator`].

use corral_core::{Pid, StateLabel};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What an RPC message asks its recipient process to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RpcIntent {
    Play,
    Pause,
    Kill,
    Status,
}

/// A control message addressed to a single process by PID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcMessage {
    pub recipient: Pid,
    pub intent: RpcIntent,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force: Option<bool>,
    pub correlation_id: String,
}

impl RpcMessage {
    pub fn new(recipient: Pid, intent: RpcIntent) -> Self {
        Self { recipient, intent, message: None, force: None, correlation_id: new_correlation_id() }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_force(mut self, force: bool) -> Self {
        self.force = Some(force);
        self
    }
}

/// What the process replies with once it has scheduled (or completed)
/// the requested control operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcReply {
    pub correlation_id: String,
    pub outcome: RpcOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RpcOutcome {
    Ok { body: Value },
    Error { message: String },
}

/// An advisory, unaddressed notification. State-change broadcasts carry
/// no body; other broadcasts may.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastMessage {
    pub subject: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<Pid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl BroadcastMessage {
    pub fn new(subject: impl Into<String>) -> Self {
        Self { subject: subject.into(), sender: None, correlation_id: None, body: None }
    }
}

/// The advisory subject published whenever a process enters a new
/// non-terminal state: `"state_changed.{from}.{to}"`.
pub fn state_changed_subject(from: StateLabel, to: StateLabel) -> String {
    format!("state_changed.{}.{}", from.as_str(), to.as_str())
}

pub fn new_correlation_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Well-known fleet-wide control subjects used by `pause_all`/`play_all`/
/// `kill_all`.
pub const CONTROL_PLAY_SUBJECT: &str = "control.play";
pub const CONTROL_PAUSE_SUBJECT: &str = "control.pause";
pub const CONTROL_KILL_SUBJECT: &str = "control.kill";
