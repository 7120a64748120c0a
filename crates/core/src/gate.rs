// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Quality gate definitions: guidance text plus optional validation criteria.

use serde::{Deserialize, Serialize};

/// Whether a gate validates output or only contributes guidance text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateType {
    /// `pass_criteria` are evaluated against the model output
    Validation,
    /// Guidance text only; never fails
    #[default]
    Guidance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateSeverity {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

/// How a failing gate affects chain progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnforcementMode {
    /// Failure halts the step and demands a retry
    #[default]
    Blocking,
    /// Failure is reported but the step proceeds
    Advisory,
    /// Failure is logged only
    Informational,
}

/// Where a gate comes from, for activation filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateKind {
    /// Bound to a methodology; only applies when framework gates are enabled
    Framework,
    /// Activated by prompt category
    Category,
    #[default]
    Custom,
}

/// Output format a `Format` criterion checks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Markdown,
    Json,
    Yaml,
}

/// Aggressiveness tier of the secret scanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityTier {
    Basic,
    #[default]
    Standard,
    Strict,
}

/// One structured pass check of a validation gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "check", rename_all = "snake_case")]
pub enum PassCriterion {
    /// Content must parse as / look like the given format
    Format { format: OutputFormat },
    /// Named markdown sections must be present
    SectionsPresent { sections: Vec<String> },
    /// Header structure: single H1, bounded depth, no consecutive headers
    Hierarchy {
        #[serde(default = "default_true")]
        require_h1: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_depth: Option<u8>,
        #[serde(default)]
        forbid_consecutive: bool,
    },
    /// Code block sanity: balanced brackets, bounded nesting
    CodeQuality {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_nesting: Option<u32>,
    },
    /// Named `field:` entries must appear in the content
    RequiredFields { fields: Vec<String> },
    /// Composite length/structure/richness score must clear a floor
    Completeness { min_score: f64 },
    /// Pattern-based secret scan must find nothing
    Security {
        #[serde(default)]
        tier: SecurityTier,
    },
    /// All listed phrases must appear (case-insensitive)
    PhrasePresent { phrases: Vec<String> },
    /// None of the listed phrases may appear (case-insensitive)
    PhraseAbsent { phrases: Vec<String> },
    /// Word count bounds
    WordCount {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<usize>,
    },
    /// Shell-verify: the command must exit 0
    Shell { command: String },
    /// Freeform criteria text carried by inline gates; matched as phrases
    Criteria { criteria: Vec<String> },
}

fn default_true() -> bool {
    true
}

/// When a gate activates without being explicitly requested.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActivationRules {
    /// Prompt categories this gate auto-activates for
    #[serde(default)]
    pub prompt_categories: Vec<String>,
    /// Framework IDs under which this gate activates
    #[serde(default)]
    pub framework_context: Vec<String>,
    /// Gate only applies when named in the request
    #[serde(default)]
    pub explicit_request: bool,
}

/// Retry behavior when a blocking gate fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub improvement_hints: Vec<String>,
    /// Keep the previous step result visible to the retry prompt
    #[serde(default)]
    pub preserve_context: bool,
}

fn default_max_attempts() -> u32 {
    2
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            improvement_hints: Vec::new(),
            preserve_context: false,
        }
    }
}

/// Caller-resolved action once a gate's retry budget is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateAction {
    Retry,
    Skip,
    /// Absent `gate_action` in the request resolves to abort
    #[default]
    Abort,
}

/// A named quality check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub gate_type: GateType,
    #[serde(default)]
    pub severity: GateSeverity,
    #[serde(default)]
    pub enforcement_mode: EnforcementMode,
    #[serde(default)]
    pub kind: GateKind,
    #[serde(default)]
    pub description: String,
    /// Freeform text injected into prompts
    #[serde(default)]
    pub guidance: String,
    /// Structured pass checks; only considered for validation gates
    #[serde(default)]
    pub pass_criteria: Vec<PassCriterion>,
    #[serde(default)]
    pub activation: ActivationRules,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl GateDefinition {
    /// Whether failing this gate blocks chain progression.
    pub fn is_blocking(&self) -> bool {
        self.gate_type == GateType::Validation && self.enforcement_mode == EnforcementMode::Blocking
    }

    /// Build an anonymous inline gate from `:: "criteria"` operator text.
    pub fn anonymous_inline(criteria: Vec<String>) -> Self {
        Self {
            id: "inline".to_string(),
            name: "Inline criteria".to_string(),
            gate_type: GateType::Validation,
            severity: GateSeverity::Medium,
            enforcement_mode: EnforcementMode::Blocking,
            kind: GateKind::Custom,
            description: String::new(),
            guidance: criteria.join("; "),
            pass_criteria: vec![PassCriterion::Criteria { criteria }],
            activation: ActivationRules::default(),
            retry: RetryConfig::default(),
        }
    }
}

#[cfg(test)]
#[path = "gate_tests.rs"]
mod tests;
