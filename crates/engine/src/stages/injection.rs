// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage: injection control (the seven-level resolver).

use crate::context::ExecutionContext;
use crate::error::EngineError;
use crate::injection::{resolve, InjectionQuery, INJECTION_TYPES};
use crate::orchestrator::Engine;
use px_adapters::ScriptExecutor;
use px_core::Clock;

impl<S: ScriptExecutor, C: Clock + Clone> Engine<S, C> {
    pub(crate) fn stage_injection(&self, ctx: &mut ExecutionContext) -> Result<(), EngineError> {
        let parsed = ctx.parsed()?;
        let prompt = self.registries.prompts.get(&parsed.prompt_id);

        // The step about to render: fresh requests start at 1, resumes
        // render the step after the blueprint's current one.
        let current_step = match &ctx.blueprint {
            Some(bp) if ctx.state.session.restored_from_blueprint => bp.current_step + 1,
            _ => 1,
        };

        let chain_rule = prompt.as_ref().and_then(|p| p.injection);
        let step_annotation = prompt.as_ref().and_then(|p| {
            p.chain_steps
                .get(current_step.saturating_sub(1) as usize)
                .and_then(|s| s.injection)
        });
        let session_override = *self.runtime_injection_override.lock();
        let category = prompt.as_ref().map(|p| p.category.clone());

        let query = InjectionQuery {
            session_override: session_override.as_ref(),
            request_override: ctx.request.injection.as_ref(),
            step_annotation: step_annotation.as_ref(),
            chain_rule: chain_rule.as_ref(),
            category: category.as_deref(),
            current_step,
        };

        for injection_type in INJECTION_TYPES {
            let decision = resolve(&self.config.injection, &query, injection_type);
            ctx.state.injection.decisions.insert(injection_type, decision);
        }
        Ok(())
    }
}
