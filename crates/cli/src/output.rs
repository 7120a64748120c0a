// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response rendering for the terminal.

use anyhow::Result;
use clap::ValueEnum;
use px_engine::EngineResponse;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print an engine response; errors exit non-zero.
pub fn print_response(response: &EngineResponse, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(response)?),
        OutputFormat::Text => {
            for block in &response.content {
                println!("{}", block.text);
            }
            if let Some(chain_id) = response.metadata.get("chain_id").and_then(|v| v.as_str()) {
                eprintln!("chain_id: {chain_id}");
            }
        }
    }
    if response.is_error {
        std::process::exit(1);
    }
    Ok(())
}
