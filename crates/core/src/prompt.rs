// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prompt template definitions loaded from the resource tree.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::plan::ExecutionPlan;

/// Declared type of a prompt argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentType {
    #[default]
    String,
    Number,
    Boolean,
    Array,
    Object,
}

/// Schema constraints applied to a parsed argument value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArgumentValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Regex the string form of the value must match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// One argument a prompt template accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgumentSpec {
    pub name: String,
    #[serde(default, rename = "type")]
    pub arg_type: ArgumentType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ArgumentValidation>,
}

/// Gate wiring on a prompt: which gates to force in, which to keep out.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GateConfiguration {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
    /// When true, framework-kind gates activated by category also apply
    #[serde(default)]
    pub framework_gates: bool,
}

/// How a script tool is admitted into a pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptToolMode {
    /// Run immediately when the tool's trigger matches
    #[default]
    Auto,
    /// Require explicit approval; execution is deferred
    Confirm,
    /// Skipped unless explicitly named in the request
    Manual,
    /// Run, then inspect the JSON output's `valid` field before proceeding
    AutoApproveOnValid,
}

/// A subprocess tool a prompt may invoke before rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptTool {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Program to execute
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub mode: ScriptToolMode,
    /// Substrings of the raw argument text that select this tool
    #[serde(default)]
    pub triggers: Vec<String>,
}

/// Per-scope injection annotations: each field, when set, decides whether
/// that injection type applies at this scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InjectionAnnotations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_guidance: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_guidance: Option<bool>,
}

impl InjectionAnnotations {
    pub fn is_empty(&self) -> bool {
        self.system_prompt.is_none()
            && self.gate_guidance.is_none()
            && self.style_guidance.is_none()
    }
}

/// An element of a chain prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainStep {
    /// 1-based position in the chain
    pub step_number: u32,
    pub prompt_id: String,
    /// Arguments for this step; inherits the parent arg map
    #[serde(default)]
    pub args: IndexMap<String, Value>,
    /// Name this step's output is bound to for later steps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable_name: Option<String>,
    /// chain-global variable name -> step argument name
    #[serde(default)]
    pub input_mapping: HashMap<String, String>,
    /// step output name -> chain-global variable name
    #[serde(default)]
    pub output_mapping: HashMap<String, String>,
    #[serde(default)]
    pub retries: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_plan: Option<ExecutionPlan>,
    /// Step-scoped injection annotations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injection: Option<InjectionAnnotations>,
}

impl ChainStep {
    /// Variable name this step's output is stored under; defaults to
    /// `step_<n>` when the definition does not bind one.
    pub fn output_variable(&self) -> String {
        self.variable_name
            .clone()
            .unwrap_or_else(|| format!("step_{}", self.step_number))
    }
}

/// An identified prompt template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,
    /// Template with `{{name}}` placeholders, `{%if%}` conditionals, and
    /// `{{ref:...}}` / `{{script:...}}` references
    #[serde(default)]
    pub user_message_template: String,
    #[serde(default)]
    pub arguments: Vec<ArgumentSpec>,
    /// Non-empty iff this prompt is a chain
    #[serde(default)]
    pub chain_steps: Vec<ChainStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_configuration: Option<GateConfiguration>,
    #[serde(default)]
    pub script_tools: Vec<ScriptTool>,
    /// Chain-scoped injection annotations (applies to every step)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injection: Option<InjectionAnnotations>,
    /// Directory the definition was loaded from; resolves local references
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_dir: Option<PathBuf>,
}

impl PromptDefinition {
    /// A prompt is a chain iff it declares at least one chain step.
    pub fn is_chain(&self) -> bool {
        !self.chain_steps.is_empty()
    }

    /// Look up an argument spec by name.
    pub fn argument(&self, name: &str) -> Option<&ArgumentSpec> {
        self.arguments.iter().find(|a| a.name == name)
    }

    /// Names of arguments marked required.
    pub fn required_arguments(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.arguments.iter().filter(|a| a.required)
    }
}

#[cfg(test)]
#[path = "prompt_tests.rs"]
mod tests;
