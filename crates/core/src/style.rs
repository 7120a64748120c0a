// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Response style definitions (#analytical, #procedural, ...).

use serde::{Deserialize, Serialize};

use crate::gate::ActivationRules;

/// How style guidance combines with the system prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhancementMode {
    Prepend,
    #[default]
    Append,
    Replace,
}

/// A response-shape modifier selected with the `#style` operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub guidance: String,
    #[serde(default)]
    pub enhancement_mode: EnhancementMode,
    /// Higher priority wins when several styles activate
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub activation: ActivationRules,
    #[serde(default)]
    pub compatible_frameworks: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl StyleDefinition {
    /// Whether this style may combine with the given framework.
    /// An empty compatibility list means compatible with all.
    pub fn compatible_with(&self, framework_id: &str) -> bool {
        self.compatible_frameworks.is_empty()
            || self
                .compatible_frameworks
                .iter()
                .any(|f| f.eq_ignore_ascii_case(framework_id))
    }

    /// Combine this style's guidance with an existing system prompt.
    pub fn apply(&self, system_prompt: &str) -> String {
        match self.enhancement_mode {
            EnhancementMode::Prepend if system_prompt.is_empty() => self.guidance.clone(),
            EnhancementMode::Prepend => format!("{}\n\n{}", self.guidance, system_prompt),
            EnhancementMode::Append if system_prompt.is_empty() => self.guidance.clone(),
            EnhancementMode::Append => format!("{}\n\n{}", system_prompt, self.guidance),
            EnhancementMode::Replace => self.guidance.clone(),
        }
    }
}
