// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `px daemon` - start, stop, and probe pxd.

use crate::client::DaemonClient;
use anyhow::{anyhow, Context, Result};
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start pxd in the background
    Start,
    /// Ask a running pxd to shut down
    Stop,
    /// Check whether pxd is responding
    Status,
}

pub async fn run(args: DaemonArgs) -> Result<()> {
    match args.command {
        DaemonCommand::Start => start().await,
        DaemonCommand::Stop => stop().await,
        DaemonCommand::Status => status().await,
    }
}

async fn start() -> Result<()> {
    if DaemonClient::connect().await.is_ok() {
        println!("pxd is already running");
        return Ok(());
    }
    // pxd sits next to the px binary
    let pxd = std::env::current_exe()
        .context("cannot locate the px binary")?
        .with_file_name("pxd");
    std::process::Command::new(&pxd)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .with_context(|| format!("failed to spawn {}", pxd.display()))?;
    println!("pxd started");
    Ok(())
}

async fn stop() -> Result<()> {
    let mut client = DaemonClient::connect().await?;
    match client.request(px_daemon::Request::Shutdown).await? {
        px_daemon::Response::ShuttingDown => {
            println!("pxd shutting down");
            Ok(())
        }
        other => Err(anyhow!("unexpected daemon response: {other:?}")),
    }
}

async fn status() -> Result<()> {
    let mut client = DaemonClient::connect().await?;
    match client.request(px_daemon::Request::Ping).await? {
        px_daemon::Response::Pong => {
            println!("pxd is running");
            Ok(())
        }
        other => Err(anyhow!("unexpected daemon response: {other:?}")),
    }
}
