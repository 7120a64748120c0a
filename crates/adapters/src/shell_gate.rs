// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shell-verify gate execution.
//!
//! A shell-verify criterion passes iff its command exits 0. The command
//! runs under `sh -c` with the gate timeout; output is captured for the
//! failure report only.

use crate::subprocess::{run_with_timeout, GATE_TIMEOUT};
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("shell-verify gate failed to run: {0}")]
pub struct ShellGateError(pub String);

/// Outcome of a shell-verify criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellVerdict {
    pub passed: bool,
    pub stderr: String,
}

/// Run a shell-verify command; exit status 0 is a pass.
pub async fn run_shell_verify(command: &str) -> Result<ShellVerdict, ShellGateError> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    let output = run_with_timeout(cmd, GATE_TIMEOUT, "shell-verify gate")
        .await
        .map_err(ShellGateError)?;
    Ok(ShellVerdict {
        passed: output.status.success(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn exit_zero_passes() {
        let verdict = run_shell_verify("true").await.unwrap();
        assert!(verdict.passed);
    }

    #[tokio::test]
    async fn nonzero_exit_fails_with_stderr() {
        let verdict = run_shell_verify("echo nope >&2; exit 1").await.unwrap();
        assert!(!verdict.passed);
        assert!(verdict.stderr.contains("nope"));
    }
}
