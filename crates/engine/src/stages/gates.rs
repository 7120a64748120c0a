// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage: gate enhancement.
//!
//! Resolves the plan's gate IDs to definitions (registry entries, inline
//! command gates, request gate specs), renders the combined guidance
//! text, and accumulates gate IDs on the context.

use crate::context::ExecutionContext;
use crate::error::EngineError;
use crate::orchestrator::Engine;
use crate::request::InlineGateSpec;
use px_adapters::ScriptExecutor;
use px_core::{
    fold_id, Clock, GateDefinition, GateType, PassCriterion,
};
use std::sync::Arc;

impl<S: ScriptExecutor, C: Clock + Clone> Engine<S, C> {
    pub(crate) fn stage_gate_enhancement(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(), EngineError> {
        let plan_gates = ctx.plan()?.gates.clone();
        let parsed = ctx.parsed()?.clone();

        let mut definitions: Vec<Arc<GateDefinition>> = Vec::new();
        for id in &plan_gates {
            if let Some(def) = self.resolve_gate_definition(id, ctx) {
                definitions.push(def);
            } else {
                tracing::warn!(gate = %id, "planned gate has no resolvable definition");
            }
        }

        // Named inline gates not already planned (defensive second pass)
        for named in &parsed.named_inline_gates {
            let key = fold_id(&named.gate_id);
            if !definitions.iter().any(|d| fold_id(&d.id) == key) {
                definitions.push(Arc::new(synthesize_named_gate(
                    &named.gate_id,
                    &named.criteria,
                    named.shell_command.as_deref(),
                )));
            }
        }

        let mut instructions = String::new();
        for def in &definitions {
            if def.guidance.is_empty() {
                continue;
            }
            if !instructions.is_empty() {
                instructions.push_str("\n\n");
            }
            instructions.push_str(&format!("## Gate: {}\n{}", def.name, def.guidance));
        }

        ctx.state.gates.accumulated_gate_ids = definitions.iter().map(|d| fold_id(&d.id)).collect();
        ctx.state.gates.instructions = if instructions.is_empty() {
            None
        } else {
            Some(instructions)
        };
        ctx.state.gates.definitions = definitions;
        Ok(())
    }

    fn resolve_gate_definition(
        &self,
        id: &str,
        ctx: &ExecutionContext,
    ) -> Option<Arc<GateDefinition>> {
        if let Some(def) = self.registries.gates.get(id) {
            return Some(def);
        }
        let parsed = ctx.parsed_command.as_ref()?;
        if id == "inline" {
            let mut criteria = parsed.inline_gate_criteria.clone();
            criteria.extend(ctx.request.custom_checks.iter().cloned());
            if !criteria.is_empty() {
                return Some(Arc::new(GateDefinition::anonymous_inline(criteria)));
            }
        }
        if let Some(named) = parsed
            .named_inline_gates
            .iter()
            .find(|g| fold_id(&g.gate_id) == fold_id(id))
        {
            return Some(Arc::new(synthesize_named_gate(
                &named.gate_id,
                &named.criteria,
                named.shell_command.as_deref(),
            )));
        }
        for spec in &ctx.request.gates {
            match spec {
                InlineGateSpec::Registered(_) => {}
                InlineGateSpec::Quick { name, description } => {
                    if fold_id(name) == fold_id(id) {
                        let mut def = GateDefinition::anonymous_inline(vec![description.clone()]);
                        def.id = fold_id(name);
                        def.name = name.clone();
                        def.gate_type = GateType::Guidance;
                        def.guidance = description.clone();
                        return Some(Arc::new(def));
                    }
                }
                InlineGateSpec::Full(def) => {
                    if fold_id(&def.id) == fold_id(id) {
                        return Some(Arc::new(def.clone()));
                    }
                }
            }
        }
        None
    }
}

fn synthesize_named_gate(
    gate_id: &str,
    criteria: &[String],
    shell_command: Option<&str>,
) -> GateDefinition {
    let mut def = GateDefinition::anonymous_inline(criteria.to_vec());
    def.id = fold_id(gate_id);
    def.name = gate_id.to_string();
    if let Some(command) = shell_command {
        def.pass_criteria = vec![PassCriterion::Shell {
            command: command.to_string(),
        }];
        def.guidance = format!("Output must satisfy `{command}` (exit status 0).");
    }
    def
}
