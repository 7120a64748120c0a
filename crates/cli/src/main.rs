// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! px - Prompt Exec CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "px",
    version,
    about = "Prompt Exec - run registered prompt templates through the execution pipeline"
)]
struct Cli {
    /// Output format
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        default_value_t,
        global = true
    )]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a symbolic command, e.g. '>>greet name="Ada"'
    Run(commands::run::RunArgs),
    /// Resume a chain with the previous step's output
    Resume(commands::resume::ResumeArgs),
    /// Show daemon and registry status
    Status,
    /// Daemon management
    Daemon(commands::daemon::DaemonArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => commands::run::run(args, cli.output).await,
        Commands::Resume(args) => commands::resume::run(args, cli.output).await,
        Commands::Status => commands::status::run(cli.output).await,
        Commands::Daemon(args) => commands::daemon::run(args).await,
    }
}
