// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `px run` - execute a symbolic command.

use crate::client::DaemonClient;
use crate::output::{print_response, OutputFormat};
use anyhow::{anyhow, Result};
use clap::Args;
use px_engine::ExecutionRequest;

#[derive(Args)]
pub struct RunArgs {
    /// The symbolic command, e.g. '>>greet name="Ada"'
    pub command: String,

    /// key=value options merged into prompt arguments
    #[arg(long = "option", value_name = "KEY=VALUE")]
    pub options: Vec<String>,

    /// Gate IDs to apply on top of the plan
    #[arg(long = "gate")]
    pub gates: Vec<String>,

    /// Ignore cached chain state
    #[arg(long)]
    pub force_restart: bool,

    /// Per-request deadline in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,
}

pub async fn run(args: RunArgs, format: OutputFormat) -> Result<()> {
    let mut request = ExecutionRequest::from_command(&args.command);
    request.quality_gates = args.gates;
    request.force_restart = args.force_restart;
    request.timeout_ms = args.timeout_ms;
    for option in &args.options {
        let (key, value) = option
            .split_once('=')
            .ok_or_else(|| anyhow!("--option expects KEY=VALUE, got '{option}'"))?;
        request
            .options
            .insert(key.to_string(), serde_json::Value::String(value.to_string()));
    }

    let mut client = DaemonClient::connect().await?;
    match client.request(px_daemon::Request::Execute { request }).await? {
        px_daemon::Response::Execution { response } => print_response(&response, format),
        other => Err(anyhow!("unexpected daemon response: {other:?}")),
    }
}
