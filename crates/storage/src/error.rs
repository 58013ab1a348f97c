// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage-layer errors: the `persistence_error` kind at the disk/memory
//! boundary.

use corral_core::Pid;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("checkpoint for {pid}{} not found", tag_suffix(tag))]
    NotFound { pid: Pid, tag: Option<String> },

    #[error("io error writing checkpoint for {pid}: {source}")]
    Io {
        pid: Pid,
        #[source]
        source: std::io::Error,
    },

    #[error("checkpoint directory io error: {0}")]
    DirIo(#[source] std::io::Error),

    #[error("failed to (de)serialize checkpoint: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("failed to (de)compress checkpoint: {0}")]
    Compression(#[source] std::io::Error),

    #[error(transparent)]
    Bundle(#[from] corral_persistence::PersistError),
}

fn tag_suffix(tag: &Option<String>) -> String {
    match tag {
        Some(t) => format!(" (tag={t})"),
        None => String::new(),
    }
}
