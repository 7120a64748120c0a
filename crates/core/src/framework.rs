// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Methodology framework definitions (CAGEERF, ReACT, 5W1H, SCAMPER, ...).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A named methodology whose guidance is injected into system prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Methodology family label, e.g. `CAGEERF`, `ReACT`, `5W1H`, `SCAMPER`
    #[serde(default, rename = "type")]
    pub framework_type: String,
    /// Supports `{METHODOLOGY_GUIDANCE}` and `{PROMPT_NAME}` placeholders
    #[serde(default)]
    pub system_prompt_template: String,
    /// Freeform methodology guidance substituted into the template
    #[serde(default)]
    pub guidance: String,
    /// Literal substring whose presence in a prompt's own system message
    /// means the framework is already injected. Defaults to the rendered
    /// template's first line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injection_marker: Option<String>,
    /// Per-step guidance keyed by step number (as a string, YAML-friendly)
    #[serde(default)]
    pub step_guidance: HashMap<String, String>,
}

impl FrameworkDefinition {
    /// The marker scanned for when avoiding double injection.
    pub fn marker(&self) -> String {
        if let Some(marker) = &self.injection_marker {
            return marker.clone();
        }
        // First non-empty template line, fully substituted, is canonical.
        self.system_prompt_template
            .replace("{METHODOLOGY_GUIDANCE}", &self.guidance)
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or_default()
            .to_string()
    }
}

/// Renders per-template and per-step guidance for one framework.
#[derive(Debug, Clone)]
pub struct MethodologyGuide {
    framework: FrameworkDefinition,
}

impl MethodologyGuide {
    pub fn new(framework: FrameworkDefinition) -> Self {
        Self { framework }
    }

    pub fn framework(&self) -> &FrameworkDefinition {
        &self.framework
    }

    /// Expand the framework's system prompt template for a prompt.
    pub fn render_system_prompt(&self, prompt_name: &str) -> String {
        self.framework
            .system_prompt_template
            .replace("{METHODOLOGY_GUIDANCE}", &self.framework.guidance)
            .replace("{PROMPT_NAME}", prompt_name)
            .trim()
            .to_string()
    }

    /// Per-step guidance, when the framework defines any for this step.
    pub fn step_guidance(&self, step_number: u32) -> Option<&str> {
        self.framework
            .step_guidance
            .get(&step_number.to_string())
            .map(String::as_str)
    }
}

#[cfg(test)]
#[path = "framework_tests.rs"]
mod tests;
