// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session blueprints: the persisted snapshot that makes a chain resumable.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::command::ParsedCommand;
use crate::id::{ChainId, SessionId};
use crate::plan::ExecutionPlan;

/// Serializable snapshot of an in-flight chain, keyed by session ID.
///
/// Created when a chain starts, mutated by the session stage on each
/// resume, deleted when the chain completes or is aborted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionBlueprint {
    pub session_id: SessionId,
    /// Caller-facing resumption token
    pub chain_id: ChainId,
    pub parsed_command: ParsedCommand,
    pub execution_plan: ExecutionPlan,
    /// Rendered gate guidance text captured at chain start
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_instructions: Option<String>,
    /// 1-based; `current_step > total_steps` means the chain is complete
    pub current_step: u32,
    pub total_steps: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_step_result: Option<String>,
    /// A blocking gate failed; the next request must resolve the review
    #[serde(default)]
    pub pending_review: bool,
    /// Gate review attempts consumed at the current step
    #[serde(default)]
    pub review_attempts: u32,
    /// Chain-global variable namespace (step outputs by variable name)
    #[serde(default)]
    pub variables: HashMap<String, String>,
    pub created_at_ms: u64,
    #[serde(default)]
    pub updated_at_ms: u64,
}

impl SessionBlueprint {
    /// The invariant: a blueprint whose `current_step` has run past
    /// `total_steps` is complete and gets purged on the next touch.
    pub fn is_complete(&self) -> bool {
        self.current_step > self.total_steps
    }

    /// Record a step's output under its bound variable name.
    pub fn bind_variable(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }
}

#[cfg(test)]
#[path = "blueprint_tests.rs"]
mod tests;
