// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The planning stage's logic: strategy, gate selection, framework
//! requirement, and per-step sub-plans for chains.

use crate::error::EngineError;
use crate::request::{ExecutionRequest, InlineGateSpec};
use px_core::{
    fold_id, CommandType, ExecutionPlan, ExecutionStrategy, GateKind, ParsedCommand,
    PlanModifiers, PromptDefinition, StepPlan,
};
use px_registry::RegistrySet;

/// Build the execution plan for a parsed command.
pub fn build_plan(
    parsed: &ParsedCommand,
    registries: &RegistrySet,
    request: &ExecutionRequest,
) -> Result<ExecutionPlan, EngineError> {
    let prompt = registries.prompts.get(&parsed.prompt_id).ok_or_else(|| {
        EngineError::ResourceNotFound {
            kind: "prompt",
            id: parsed.prompt_id.clone(),
            suggestions: Vec::new(),
        }
    })?;

    let strategy = match parsed.command_type {
        CommandType::Single => ExecutionStrategy::Single,
        CommandType::Chain => ExecutionStrategy::Chain,
    };

    let mut gates = select_gates(&prompt, registries, parsed, request);

    // Chains aggregate every step's gates into the chain-level plan
    let mut step_plans = Vec::new();
    if strategy == ExecutionStrategy::Chain {
        for step in &parsed.steps {
            let step_prompt = registries.prompts.get(&step.prompt_id).ok_or_else(|| {
                EngineError::ResourceNotFound {
                    kind: "prompt",
                    id: step.prompt_id.clone(),
                    suggestions: Vec::new(),
                }
            })?;
            let step_gates = select_prompt_gates(&step_prompt, registries);
            for gate in &step_gates {
                push_unique(&mut gates, gate.clone());
            }
            step_plans.push(StepPlan {
                step_number: step.step_number,
                prompt_id: step.prompt_id.clone(),
                gates: step_gates,
            });
        }
    }

    let framework_override = parsed.framework_override().map(str::to_string);
    let requires_framework = framework_override.is_some()
        || gates.iter().any(|id| {
            registries
                .gates
                .get(id)
                .is_some_and(|g| g.kind == GateKind::Framework)
        });

    Ok(ExecutionPlan {
        strategy,
        gates,
        requires_framework,
        requires_session: strategy == ExecutionStrategy::Chain,
        api_validation_enabled: request.api_validation.unwrap_or(false),
        modifiers: PlanModifiers {
            framework_override,
            style_override: parsed.style_selection.clone(),
            lean: parsed.has_operator(&px_core::CommandOperator::Lean),
            clean: parsed.has_operator(&px_core::CommandOperator::Clean),
        },
        step_plans,
    })
}

/// Gate selection for one prompt: configured includes, category-activated
/// registry gates, explicit request gates, and inline command gates,
/// minus the configured excludes.
fn select_gates(
    prompt: &PromptDefinition,
    registries: &RegistrySet,
    parsed: &ParsedCommand,
    request: &ExecutionRequest,
) -> Vec<String> {
    let mut gates = select_prompt_gates(prompt, registries);

    for id in &request.quality_gates {
        push_unique(&mut gates, fold_id(id));
    }
    for spec in &request.gates {
        let id = match spec {
            InlineGateSpec::Registered(id) => fold_id(id),
            InlineGateSpec::Quick { name, .. } => fold_id(name),
            InlineGateSpec::Full(def) => fold_id(&def.id),
        };
        push_unique(&mut gates, id);
    }
    for named in &parsed.named_inline_gates {
        push_unique(&mut gates, fold_id(&named.gate_id));
    }
    if !parsed.inline_gate_criteria.is_empty() || !request.custom_checks.is_empty() {
        push_unique(&mut gates, "inline".to_string());
    }

    let excluded: Vec<String> = prompt
        .gate_configuration
        .as_ref()
        .map(|c| c.exclude.iter().map(|e| fold_id(e)).collect())
        .unwrap_or_default();
    gates.retain(|g| !excluded.contains(g));
    gates
}

/// The prompt-local part of gate selection: includes plus
/// category-activated registry gates.
fn select_prompt_gates(prompt: &PromptDefinition, registries: &RegistrySet) -> Vec<String> {
    let mut gates = Vec::new();
    let framework_gates_enabled = prompt
        .gate_configuration
        .as_ref()
        .map(|c| c.framework_gates)
        .unwrap_or(false);

    if let Some(config) = &prompt.gate_configuration {
        for id in &config.include {
            push_unique(&mut gates, fold_id(id));
        }
    }

    let category = fold_id(&prompt.category);
    for gate in registries.gates.all() {
        if gate.activation.explicit_request {
            continue;
        }
        let category_match = gate
            .activation
            .prompt_categories
            .iter()
            .any(|c| fold_id(c) == category);
        if !category_match {
            continue;
        }
        if gate.kind == GateKind::Framework && !framework_gates_enabled {
            continue;
        }
        push_unique(&mut gates, fold_id(&gate.id));
    }
    gates
}

fn push_unique(gates: &mut Vec<String>, id: String) {
    if !gates.contains(&id) {
        gates.push(id);
    }
}

#[cfg(test)]
#[path = "planner_tests.rs"]
mod tests;
