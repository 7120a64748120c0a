// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Injection decision resolver.
//!
//! For each injection type the hierarchy is consulted top-down, first
//! match wins:
//!
//! 1. session runtime override (admin control surface)
//! 2. explicit request override
//! 3. per-step annotation in the prompt definition
//! 4. chain-level rule
//! 5. category-level rule
//! 6. global default from configuration
//! 7. fallback: inject iff the type is `SystemPrompt` on step 1
//!
//! The decision records its source for diagnostics.

use px_core::InjectionAnnotations;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionType {
    SystemPrompt,
    GateGuidance,
    StyleGuidance,
}

/// All injection types, for iteration.
pub const INJECTION_TYPES: [InjectionType; 3] = [
    InjectionType::SystemPrompt,
    InjectionType::GateGuidance,
    InjectionType::StyleGuidance,
];

/// Which hierarchy level decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionSource {
    SessionOverride,
    RequestOverride,
    StepAnnotation,
    ChainRule,
    CategoryRule,
    GlobalDefault,
    Fallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionDecision {
    pub inject: bool,
    pub source: InjectionSource,
}

/// Configured levels 5 and 6 of the hierarchy.
#[derive(Debug, Clone, Default)]
pub struct InjectionConfig {
    /// Global defaults (level 6)
    pub global: InjectionAnnotations,
    /// Category-level rules (level 5), keyed by prompt category
    pub category_rules: HashMap<String, InjectionAnnotations>,
}

/// Everything the resolver consults for one decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct InjectionQuery<'a> {
    /// Level 1: runtime override set through the admin surface
    pub session_override: Option<&'a InjectionAnnotations>,
    /// Level 2: request field
    pub request_override: Option<&'a InjectionAnnotations>,
    /// Level 3: the current chain step's annotation
    pub step_annotation: Option<&'a InjectionAnnotations>,
    /// Level 4: the chain prompt's annotation
    pub chain_rule: Option<&'a InjectionAnnotations>,
    /// Level 5 key
    pub category: Option<&'a str>,
    /// 1-based step for the fallback rule
    pub current_step: u32,
}

fn annotation_value(
    annotations: Option<&InjectionAnnotations>,
    injection_type: InjectionType,
) -> Option<bool> {
    let a = annotations?;
    match injection_type {
        InjectionType::SystemPrompt => a.system_prompt,
        InjectionType::GateGuidance => a.gate_guidance,
        InjectionType::StyleGuidance => a.style_guidance,
    }
}

/// Resolve one injection decision through the seven-level hierarchy.
pub fn resolve(
    config: &InjectionConfig,
    query: &InjectionQuery<'_>,
    injection_type: InjectionType,
) -> InjectionDecision {
    let category_rule = query
        .category
        .and_then(|c| config.category_rules.get(c));
    let levels: [(Option<bool>, InjectionSource); 6] = [
        (
            annotation_value(query.session_override, injection_type),
            InjectionSource::SessionOverride,
        ),
        (
            annotation_value(query.request_override, injection_type),
            InjectionSource::RequestOverride,
        ),
        (
            annotation_value(query.step_annotation, injection_type),
            InjectionSource::StepAnnotation,
        ),
        (
            annotation_value(query.chain_rule, injection_type),
            InjectionSource::ChainRule,
        ),
        (
            annotation_value(category_rule, injection_type),
            InjectionSource::CategoryRule,
        ),
        (
            annotation_value(Some(&config.global), injection_type),
            InjectionSource::GlobalDefault,
        ),
    ];
    for (value, source) in levels {
        if let Some(inject) = value {
            return InjectionDecision { inject, source };
        }
    }
    InjectionDecision {
        inject: injection_type == InjectionType::SystemPrompt && query.current_step == 1,
        source: InjectionSource::Fallback,
    }
}

#[cfg(test)]
#[path = "injection_tests.rs"]
mod tests;
