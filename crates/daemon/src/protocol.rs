// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for daemon communication.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

use px_engine::{EngineResponse, ExecutionRequest};
use serde::{Deserialize, Serialize};

/// Protocol version (from Cargo.toml)
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Request from CLI to daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Run one command (or resume) through the pipeline
    Execute { request: ExecutionRequest },

    /// Get daemon status
    Status,

    /// Request daemon shutdown
    Shutdown,
}

/// Daemon status summary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusInfo {
    pub version: String,
    pub uptime_secs: u64,
    pub prompts: usize,
    pub gates: usize,
    pub styles: usize,
    pub frameworks: usize,
    pub active_sessions: usize,
}

/// Response from daemon to CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    Pong,
    Hello { version: String },
    Execution { response: EngineResponse },
    Status { status: StatusInfo },
    ShuttingDown,
    Error { message: String },
}
