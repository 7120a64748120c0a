// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parsed symbolic command representation.
//!
//! Produced exclusively by the command-parsing stage; every later stage
//! reads it, and the session blueprint persists it verbatim so a
//! response-only resume reconstructs it bit-identically.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Surface syntax the command arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandFormat {
    /// Plain `>>prompt args` reference
    Classic,
    /// Operator-prefixed form (`@fw`, `::`, `#style`, `%lean`, chains)
    #[default]
    Symbolic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    #[default]
    Single,
    Chain,
}

/// A modifier operator parsed from the command prefix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CommandOperator {
    /// `@<framework-id>`
    FrameworkOverride { framework_id: String },
    /// `:: "criteria"`
    AnonymousGate { criteria: Vec<String> },
    /// `::<gate-id>: "criteria"`
    NamedGate { gate_id: String, criteria: Vec<String> },
    /// `::<gate-id>: $(cmd)`: pass iff the command exits 0
    ShellVerifyGate { gate_id: String, command: String },
    /// `#<style-id>`
    StyleSelection { style_id: String },
    /// `%lean`
    Lean,
    /// `%clean`
    Clean,
}

/// A named inline gate extracted from the operators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedInlineGate {
    pub gate_id: String,
    #[serde(default)]
    pub criteria: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell_command: Option<String>,
}

/// One prompt reference in a (possibly multi-step) command.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedStep {
    /// 1-based position
    pub step_number: u32,
    pub prompt_id: String,
    /// Trailing argument text attached to this reference
    #[serde(default)]
    pub raw_args: String,
    /// Typed arguments, filled by the argument-parsing stage
    #[serde(default)]
    pub args: IndexMap<String, Value>,
}

/// Output of the command parser.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedCommand {
    /// Resolved ID of the first (or only) prompt
    pub prompt_id: String,
    pub format: CommandFormat,
    pub command_type: CommandType,
    /// Trailing argument payload of the first prompt reference
    #[serde(default)]
    pub raw_args: String,
    #[serde(default)]
    pub operators: Vec<CommandOperator>,
    /// All prompt references, in execution order
    #[serde(default)]
    pub steps: Vec<ParsedStep>,
    /// Typed arguments for the first prompt, filled by the argument parser
    #[serde(default)]
    pub prompt_args: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_selection: Option<String>,
    #[serde(default)]
    pub inline_gate_criteria: Vec<String>,
    #[serde(default)]
    pub named_inline_gates: Vec<NamedInlineGate>,
}

impl ParsedCommand {
    /// Framework override from an `@` operator, if present.
    pub fn framework_override(&self) -> Option<&str> {
        self.operators.iter().find_map(|op| match op {
            CommandOperator::FrameworkOverride { framework_id } => Some(framework_id.as_str()),
            _ => None,
        })
    }

    pub fn has_operator(&self, wanted: &CommandOperator) -> bool {
        self.operators.iter().any(|op| op == wanted)
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
