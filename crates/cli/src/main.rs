// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `corral` — a small demo CLI exercising the launcher, communicator,
//! and workchain end to end without standing up a daemon.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use corral_core::RuntimeConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "corral", about = "Process orchestration runtime demo CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run `add(a, b)` to completion and print the result.
    Add {
        a: i64,
        b: i64,
    },
    /// Run a small demo workchain (step_a -> if/else -> step_d) to completion.
    Workchain,
    /// Launch a waiting process, pause it, then resume it over the
    /// communicator — a smoke test for the control surface.
    PauseResumeDemo,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Add { a, b } => commands::add::run(a, b).await,
        Command::Workchain => commands::workchain::run().await,
        Command::PauseResumeDemo => commands::pause_resume::run().await,
    }
}
