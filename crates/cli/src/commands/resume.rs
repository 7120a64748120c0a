// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `px resume` - continue a chain with the previous step's output.

use crate::client::DaemonClient;
use crate::output::{print_response, OutputFormat};
use anyhow::{anyhow, Result};
use clap::Args;
use px_core::GateAction;
use px_engine::ExecutionRequest;

#[derive(Args)]
pub struct ResumeArgs {
    /// The chain_id returned by the previous step
    pub chain_id: String,

    /// The previous step's model output
    #[arg(long = "response", value_name = "TEXT")]
    pub user_response: String,

    /// Gate outcome text: 'GATE_REVIEW: PASS|FAIL - reason'
    #[arg(long)]
    pub gate_verdict: Option<String>,

    /// Resolution once a gate's retry budget is exhausted
    #[arg(long, value_enum)]
    pub gate_action: Option<CliGateAction>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliGateAction {
    Retry,
    Skip,
    Abort,
}

impl From<CliGateAction> for GateAction {
    fn from(action: CliGateAction) -> Self {
        match action {
            CliGateAction::Retry => GateAction::Retry,
            CliGateAction::Skip => GateAction::Skip,
            CliGateAction::Abort => GateAction::Abort,
        }
    }
}

pub async fn run(args: ResumeArgs, format: OutputFormat) -> Result<()> {
    let mut request = ExecutionRequest::resume(&args.chain_id, &args.user_response);
    request.gate_verdict = args.gate_verdict;
    request.gate_action = args.gate_action.map(GateAction::from);

    let mut client = DaemonClient::connect().await?;
    match client.request(px_daemon::Request::Execute { request }).await? {
        px_daemon::Response::Execution { response } => print_response(&response, format),
        other => Err(anyhow!("unexpected daemon response: {other:?}")),
    }
}
