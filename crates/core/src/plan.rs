// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution plans produced by the planning stage.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStrategy {
    #[default]
    Single,
    Chain,
}

/// Operator modifiers resolved at plan time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlanModifiers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework_override: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_override: Option<String>,
    /// `%lean`: skip framework and style injection
    #[serde(default)]
    pub lean: bool,
    /// `%clean`: skip gate guidance injection as well
    #[serde(default)]
    pub clean: bool,
}

/// Per-step sub-plan within a chain plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepPlan {
    pub step_number: u32,
    pub prompt_id: String,
    /// Gate IDs selected for this step
    #[serde(default)]
    pub gates: Vec<String>,
}

/// The planning stage's output; the only stage permitted to write it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub strategy: ExecutionStrategy,
    /// Gate IDs to apply, aggregated across steps for chains
    #[serde(default)]
    pub gates: Vec<String>,
    #[serde(default)]
    pub requires_framework: bool,
    #[serde(default)]
    pub requires_session: bool,
    #[serde(default)]
    pub api_validation_enabled: bool,
    #[serde(default)]
    pub modifiers: PlanModifiers,
    #[serde(default)]
    pub step_plans: Vec<StepPlan>,
}

impl ExecutionPlan {
    pub fn is_chain(&self) -> bool {
        self.strategy == ExecutionStrategy::Chain
    }
}
