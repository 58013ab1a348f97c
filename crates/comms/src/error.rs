// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Communicator transport error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommError {
    #[error("connection to {recipient} is closed")]
    ConnectionClosed { recipient: String },

    #[error("channel {0:?} is invalid")]
    ChannelInvalid(String),

    #[error("rpc to {recipient} timed out")]
    Timeout { recipient: String },

    #[error("{0}")]
    Other(String),
}
