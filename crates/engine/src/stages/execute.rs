// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage: step execution. The only stage that populates
//! `execution_results`.
//!
//! Single prompts render directly. Chains render the step after the
//! blueprint's current one (or step 1 on first contact); a chain whose
//! steps are spent synthesizes a terminal "chain complete" stub instead.

use crate::chain::{bind_step_output, build_step_args};
use crate::context::{ExecutionContext, ExecutionResults};
use crate::error::EngineError;
use crate::framework::already_injected;
use crate::injection::InjectionType;
use crate::orchestrator::Engine;
use indexmap::IndexMap;
use px_adapters::{ScriptExecutor, ScriptOutcome};
use px_command::template::{render, RefSource, ScriptSource};
use px_core::{Clock, PromptDefinition};
use px_registry::RegistrySet;
use serde_json::Value;
use std::collections::HashMap;

impl<S: ScriptExecutor, C: Clock + Clone> Engine<S, C> {
    pub(crate) async fn stage_execute(&self, ctx: &mut ExecutionContext) -> Result<(), EngineError> {
        if ctx.plan()?.is_chain() {
            self.execute_chain_step(ctx)
        } else {
            self.execute_single(ctx)
        }
    }

    fn execute_single(&self, ctx: &mut ExecutionContext) -> Result<(), EngineError> {
        let parsed = ctx.parsed()?.clone();
        let prompt = self
            .registries
            .prompts
            .get(&parsed.prompt_id)
            .ok_or_else(|| EngineError::Internal("parsed prompt vanished from registry".into()))?;

        let mut args = parsed.prompt_args.clone();
        add_tool_variables(&mut args, &ctx.state.scripts.results);

        let refs = RegistryRefs {
            registries: &self.registries,
        };
        let scripts = ScriptResults(&ctx.state.scripts.results);
        let rendered = render(&prompt.user_message_template, &args, &refs, &scripts)?;
        let content = self.compose_body(ctx, &prompt, &rendered);

        ctx.execution_results = Some(ExecutionResults {
            content,
            metadata: serde_json::json!({
                "prompt_id": prompt.id,
                "strategy": "single",
            }),
            generated_at_ms: self.clock.epoch_ms(),
        });
        Ok(())
    }

    fn execute_chain_step(&self, ctx: &mut ExecutionContext) -> Result<(), EngineError> {
        let parsed = ctx.parsed()?.clone();
        let mut blueprint = ctx
            .blueprint
            .clone()
            .ok_or_else(|| EngineError::Internal("chain execution without a blueprint".into()))?;
        let chain_prompt = self.registries.prompts.get(&parsed.prompt_id);
        let captured = ctx.state.session.captured_response.clone();
        let resumed = ctx.state.session.restored_from_blueprint;

        // On a passed review, the captured output completes the current
        // step; a parked review re-renders the same step instead.
        let retrying = ctx.state.session.pending_review;
        if resumed && !retrying {
            if let Some(output) = &captured {
                let completed = blueprint.current_step;
                let step_def = chain_prompt
                    .as_ref()
                    .and_then(|p| p.chain_steps.get(completed.saturating_sub(1) as usize));
                bind_step_output(&mut blueprint, step_def, completed, output);
            }
        }

        let target = if !resumed {
            1
        } else if retrying {
            blueprint.current_step
        } else {
            blueprint.current_step + 1
        };
        ctx.state.session.target_step = Some(target);

        if target > blueprint.total_steps {
            ctx.state.session.chain_complete = true;
            let content = format!(
                "Chain complete: all {} steps have produced output.",
                blueprint.total_steps
            );
            ctx.execution_results = Some(ExecutionResults {
                content,
                metadata: serde_json::json!({
                    "prompt_id": parsed.prompt_id,
                    "strategy": "chain",
                    "chain_complete": true,
                }),
                generated_at_ms: self.clock.epoch_ms(),
            });
            ctx.blueprint = Some(blueprint);
            return Ok(());
        }

        let parsed_step = parsed
            .steps
            .get(target.saturating_sub(1) as usize)
            .cloned()
            .ok_or_else(|| {
                EngineError::Internal(format!("chain step {target} missing from parsed command"))
            })?;
        let step_prompt = self
            .registries
            .prompts
            .get(&parsed_step.prompt_id)
            .ok_or_else(|| EngineError::ResourceNotFound {
                kind: "prompt",
                id: parsed_step.prompt_id.clone(),
                suggestions: Vec::new(),
            })?;
        let step_def = chain_prompt
            .as_ref()
            .and_then(|p| p.chain_steps.get(target.saturating_sub(1) as usize));

        let previous = if retrying {
            blueprint.previous_step_result.as_deref()
        } else {
            captured
                .as_deref()
                .or(blueprint.previous_step_result.as_deref())
        };
        let mut args = build_step_args(
            &parsed.prompt_args,
            &parsed_step,
            step_def,
            &blueprint.variables,
            previous,
        );
        add_tool_variables(&mut args, &ctx.state.scripts.results);

        let refs = RegistryRefs {
            registries: &self.registries,
        };
        let scripts = ScriptResults(&ctx.state.scripts.results);
        let rendered = render(&step_prompt.user_message_template, &args, &refs, &scripts)?;
        let content = self.compose_body(ctx, &step_prompt, &rendered);

        ctx.execution_results = Some(ExecutionResults {
            content,
            metadata: serde_json::json!({
                "prompt_id": step_prompt.id,
                "strategy": "chain",
                "step": target,
                "total_steps": blueprint.total_steps,
            }),
            generated_at_ms: self.clock.epoch_ms(),
        });
        ctx.blueprint = Some(blueprint);
        Ok(())
    }

    /// Compose the response body: framework system prompt (guarded
    /// against double injection), style enhancement, the prompt's own
    /// system message, gate guidance, then the rendered template. Empty
    /// sections drop out.
    fn compose_body(
        &self,
        ctx: &ExecutionContext,
        prompt: &PromptDefinition,
        rendered: &str,
    ) -> String {
        let plan_modifiers = ctx
            .execution_plan
            .as_ref()
            .map(|p| p.modifiers.clone())
            .unwrap_or_default();
        let lean = plan_modifiers.lean;
        let clean = plan_modifiers.clean;

        let mut system_section = String::new();
        if !lean && ctx.state.injection.inject(InjectionType::SystemPrompt) {
            if let Some(fw) = &ctx.framework_context {
                if !already_injected(prompt.system_message.as_deref(), &fw.marker) {
                    system_section = fw.system_prompt.clone();
                }
            }
        }
        if !lean && ctx.state.injection.inject(InjectionType::StyleGuidance) {
            if let Some(style_id) = &plan_modifiers.style_override {
                if let Some(style) = self.registries.styles.get(style_id) {
                    let compatible = ctx
                        .framework_context
                        .as_ref()
                        .map(|fw| style.compatible_with(&fw.framework_id))
                        .unwrap_or(true);
                    if style.enabled && compatible {
                        system_section = style.apply(&system_section);
                    }
                }
            }
        }

        let mut sections: Vec<&str> = Vec::new();
        if !system_section.is_empty() {
            sections.push(&system_section);
        }
        if let Some(message) = prompt.system_message.as_deref() {
            if !message.is_empty() {
                sections.push(message);
            }
        }
        let instructions = ctx.state.gates.instructions.clone().unwrap_or_default();
        if !clean
            && ctx.state.injection.inject(InjectionType::GateGuidance)
            && !instructions.is_empty()
        {
            sections.push(&instructions);
        }
        if !rendered.is_empty() {
            sections.push(rendered);
        }
        sections.join("\n\n")
    }
}

/// Expose script outcomes as `tool_<id>` / `tool_<id>_result` variables.
fn add_tool_variables(args: &mut IndexMap<String, Value>, results: &HashMap<String, ScriptOutcome>) {
    for (id, outcome) in results {
        args.insert(
            format!("tool_{id}"),
            Value::String(outcome.stdout.trim().to_string()),
        );
        args.insert(
            format!("tool_{id}_result"),
            serde_json::json!({
                "stdout": outcome.stdout,
                "stderr": outcome.stderr,
                "exit_code": outcome.exit_code,
            }),
        );
    }
}

/// `{{ref:...}}` resolver over the prompt registry.
struct RegistryRefs<'a> {
    registries: &'a RegistrySet,
}

impl RefSource for RegistryRefs<'_> {
    fn template_for(&self, prompt_id: &str) -> Option<String> {
        self.registries
            .prompts
            .get(prompt_id)
            .map(|p| p.user_message_template.clone())
    }
}

/// `{{script:...}}` resolver over this request's captured outcomes.
struct ScriptResults<'a>(&'a HashMap<String, ScriptOutcome>);

impl ScriptSource for ScriptResults<'_> {
    fn output_for(&self, tool_id: &str) -> Option<String> {
        self.0.get(tool_id).map(|o| o.stdout.trim().to_string())
    }
}
