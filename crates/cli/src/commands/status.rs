// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `px status` - daemon and registry overview.

use crate::client::DaemonClient;
use crate::output::OutputFormat;
use anyhow::{anyhow, Result};

pub async fn run(format: OutputFormat) -> Result<()> {
    let mut client = DaemonClient::connect().await?;
    match client.request(px_daemon::Request::Status).await? {
        px_daemon::Response::Status { status } => {
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
                OutputFormat::Text => {
                    println!("pxd {} (up {}s)", status.version, status.uptime_secs);
                    println!(
                        "prompts: {}  gates: {}  styles: {}  frameworks: {}",
                        status.prompts, status.gates, status.styles, status.frameworks
                    );
                    println!("active sessions: {}", status.active_sessions);
                }
            }
            Ok(())
        }
        other => Err(anyhow!("unexpected daemon response: {other:?}")),
    }
}
