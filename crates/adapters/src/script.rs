// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Script tool execution.
//!
//! A script tool is an opaque subprocess declared on a prompt definition.
//! The executor passes the current argument map as a single JSON argument
//! appended to the declared argv, captures stdout/stderr, and inspects
//! JSON output for a `valid` field (consumed by auto-approve-on-valid
//! tools).

use crate::subprocess::{run_with_timeout, SCRIPT_TOOL_TIMEOUT};
use async_trait::async_trait;
use indexmap::IndexMap;
use px_core::ScriptTool;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("script tool '{tool}' failed: {message}")]
    ExecutionFailed { tool: String, message: String },
}

/// Captured result of one script tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptOutcome {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    /// `valid` field parsed from JSON stdout, when present
    pub valid: Option<bool>,
}

impl ScriptOutcome {
    pub fn from_output(stdout: String, stderr: String, exit_code: i32) -> Self {
        let valid = serde_json::from_str::<Value>(stdout.trim())
            .ok()
            .and_then(|v| v.get("valid").and_then(Value::as_bool));
        Self {
            stdout,
            stderr,
            exit_code,
            valid,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Capability for running a prompt's script tools.
#[async_trait]
pub trait ScriptExecutor: Clone + Send + Sync + 'static {
    async fn run(
        &self,
        tool: &ScriptTool,
        args: &IndexMap<String, Value>,
    ) -> Result<ScriptOutcome, ScriptError>;
}

/// Production executor: spawns the tool's command as a subprocess.
#[derive(Debug, Clone)]
pub struct SubprocessScriptExecutor {
    timeout: Duration,
}

impl SubprocessScriptExecutor {
    pub fn new() -> Self {
        Self {
            timeout: SCRIPT_TOOL_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SubprocessScriptExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScriptExecutor for SubprocessScriptExecutor {
    async fn run(
        &self,
        tool: &ScriptTool,
        args: &IndexMap<String, Value>,
    ) -> Result<ScriptOutcome, ScriptError> {
        let payload = serde_json::to_string(args).unwrap_or_else(|_| "{}".to_string());
        let mut cmd = Command::new(&tool.command);
        cmd.args(&tool.args).arg(payload);
        let description = format!("script tool '{}'", tool.id);
        let output = run_with_timeout(cmd, self.timeout, &description)
            .await
            .map_err(|message| ScriptError::ExecutionFailed {
                tool: tool.id.clone(),
                message,
            })?;
        Ok(ScriptOutcome::from_output(
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
            output.status.code().unwrap_or(-1),
        ))
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeScriptExecutor, ScriptCall};

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// A recorded call to the fake executor.
    #[derive(Debug, Clone)]
    pub struct ScriptCall {
        pub tool_id: String,
        pub args: IndexMap<String, Value>,
    }

    /// Test executor returning canned outcomes and recording calls.
    #[derive(Clone, Default)]
    pub struct FakeScriptExecutor {
        outcomes: Arc<Mutex<HashMap<String, ScriptOutcome>>>,
        calls: Arc<Mutex<Vec<ScriptCall>>>,
    }

    impl FakeScriptExecutor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn stub(&self, tool_id: &str, outcome: ScriptOutcome) {
            self.outcomes.lock().insert(tool_id.to_string(), outcome);
        }

        pub fn calls(&self) -> Vec<ScriptCall> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl ScriptExecutor for FakeScriptExecutor {
        async fn run(
            &self,
            tool: &ScriptTool,
            args: &IndexMap<String, Value>,
        ) -> Result<ScriptOutcome, ScriptError> {
            self.calls.lock().push(ScriptCall {
                tool_id: tool.id.clone(),
                args: args.clone(),
            });
            Ok(self
                .outcomes
                .lock()
                .get(&tool.id)
                .cloned()
                .unwrap_or_else(|| ScriptOutcome::from_output(String::new(), String::new(), 0)))
        }
    }
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
