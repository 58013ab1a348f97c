// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! corral-comms: the communicator transport contract, its in-process
//! reference implementation, and the bridge that wires a process's
//! control surface and lifecycle events onto it.

mod bridge;
mod communicator;
mod error;
mod message;

pub use bridge::attach;
pub use communicator::{BroadcastHandler, Communicator, LocalCommunicator, RpcHandler};
pub use error::CommError;
pub use message::{
    state_changed_subject, BroadcastMessage, RpcIntent, RpcMessage, RpcOutcome, RpcReply,
    CONTROL_KILL_SUBJECT, CONTROL_PAUSE_SUBJECT, CONTROL_PLAY_SUBJECT,
};
