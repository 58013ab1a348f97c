// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime-wide configuration: where checkpoints live, how they're named,
//! and how verbose logging should be.

use std::path::PathBuf;

const DEFAULT_SUFFIX: &str = "checkpoint";
const APP_NAME: &str = "corral";

/// Settings consumed by the storage and logging layers.
///
/// Built from environment variables via [`RuntimeConfig::from_env`], or
/// assembled programmatically by a caller embedding these crates as a
/// library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub checkpoint_dir: PathBuf,
    pub checkpoint_suffix: String,
    pub compact_storage: bool,
    pub log_filter: String,
}

impl RuntimeConfig {
    /// Default checkpoint directory: a platform data directory scoped to
    /// `corral`, falling back to `./.corral` if no data directory can be
    /// resolved (e.g. a minimal container without `$HOME`).
    pub fn default_checkpoint_dir() -> PathBuf {
        dirs::data_dir().map(|d| d.join(APP_NAME).join("checkpoints")).unwrap_or_else(|| {
            PathBuf::from(".").join(format!(".{APP_NAME}")).join("checkpoints")
        })
    }

    /// Read configuration from the environment, falling back to defaults
    /// for any variable that is unset.
    ///
    /// - `CORRAL_CHECKPOINT_DIR`
    /// - `CORRAL_CHECKPOINT_SUFFIX`
    /// - `CORRAL_COMPACT_STORAGE` (`"1"`/`"true"` enables zstd compression)
    /// - `CORRAL_LOG` (a `tracing-subscriber` env-filter string)
    pub fn from_env() -> Self {
        let checkpoint_dir = std::env::var("CORRAL_CHECKPOINT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_checkpoint_dir());
        let checkpoint_suffix = std::env::var("CORRAL_CHECKPOINT_SUFFIX")
            .unwrap_or_else(|_| DEFAULT_SUFFIX.to_string());
        let compact_storage = std::env::var("CORRAL_COMPACT_STORAGE")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let log_filter = std::env::var("CORRAL_LOG").unwrap_or_else(|_| "info".to_string());

        Self { checkpoint_dir, checkpoint_suffix, compact_storage, log_filter }
    }

    pub fn with_checkpoint_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.checkpoint_dir = dir.into();
        self
    }

    pub fn with_compact_storage(mut self, compact: bool) -> Self {
        self.compact_storage = compact;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            checkpoint_dir: Self::default_checkpoint_dir(),
            checkpoint_suffix: DEFAULT_SUFFIX.to_string(),
            compact_storage: false,
            log_filter: "info".to_string(),
        }
    }
}
