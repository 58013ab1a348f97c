// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task messages: the launcher's wire format for constructing, resuming,
//! and creating processes.

use corral_core::Pid;
use corral_process::TerminalOutcome;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchArgs {
    pub process_class_id: String,
    #[serde(default)]
    pub init_args: Value,
    #[serde(default)]
    pub init_kwargs: Value,
    #[serde(default)]
    pub persist: bool,
    #[serde(default)]
    pub nowait: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinueArgs {
    pub pid: Pid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default)]
    pub nowait: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateArgs {
    pub process_class_id: String,
    #[serde(default)]
    pub init_args: Value,
    #[serde(default)]
    pub init_kwargs: Value,
    #[serde(default)]
    pub persist: bool,
}

/// A self-describing task message: `task` names which args shape
/// `task_args` carries. Unknown tasks are rejected by the launcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "task", content = "task_args", rename_all = "snake_case")]
pub enum TaskMessage {
    Launch(LaunchArgs),
    Continue(ContinueArgs),
    Create(CreateArgs),
}

/// What a `launch`/`continue` task replies with. `terminal` is `None`
/// when `nowait` was requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReply {
    pub pid: Pid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal: Option<TerminalOutcome>,
}
