// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing setup shared by every binary that embeds the runtime.

use tracing_subscriber::EnvFilter;

/// Install a `tracing` subscriber writing to stderr, honoring `filter`
/// (an env-filter string such as `"corral_process=debug,info"`).
///
/// Safe to call more than once per process; subsequent calls are no-ops.
pub fn init(filter: &str) {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
