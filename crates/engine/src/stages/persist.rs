// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage: session persistence.
//!
//! Commits a resumed chain's advancement with compare-and-swap on the
//! blueprint's `current_step`. A completed chain keeps its blueprint
//! (with `current_step > total_steps`) so the store invariant purges it
//! on the next touch.

use crate::context::ExecutionContext;
use crate::error::EngineError;
use crate::orchestrator::Engine;
use px_adapters::ScriptExecutor;
use px_core::{Clock, NotificationEvent};

impl<S: ScriptExecutor, C: Clock + Clone> Engine<S, C> {
    pub(crate) fn stage_persist(&self, ctx: &mut ExecutionContext) -> Result<(), EngineError> {
        if ctx.execution_results.is_none() {
            // Nothing executed (error or pending review); do not advance
            return Ok(());
        }
        let Some(target) = ctx.state.session.target_step else {
            return Ok(());
        };
        let Some(blueprint) = ctx.blueprint.clone() else {
            return Ok(());
        };

        if !ctx.state.session.restored_from_blueprint {
            // Fresh chain start: the blueprint was stored by the session
            // stage with current_step = 1 and no step has completed yet.
            return Ok(());
        }
        if ctx.state.session.pending_review {
            // A parked review persisted the blueprint already; the step
            // did not complete, so nothing advances.
            return Ok(());
        }

        let completed_step = blueprint.current_step;
        let mut advanced = blueprint.clone();
        advanced.current_step = target;
        advanced.previous_step_result = ctx.state.session.captured_response.clone();
        advanced.pending_review = false;
        advanced.review_attempts = 0;
        advanced.updated_at_ms = self.clock.epoch_ms();

        self.store
            .compare_and_swap(blueprint.session_id.as_str(), completed_step, advanced.clone())?;

        let chain_id = advanced.chain_id.as_str().to_string();
        ctx.push_event(NotificationEvent::ChainStepComplete {
            chain_id: chain_id.clone(),
            step: completed_step,
            total_steps: advanced.total_steps,
        });
        if ctx.state.session.chain_complete {
            ctx.push_event(NotificationEvent::ChainComplete { chain_id });
        }

        if let Some(session) = ctx.session_context.as_mut() {
            session.current_step = target;
            session.previous_step_result = advanced.previous_step_result.clone();
            session.pending_review = false;
        }
        ctx.blueprint = Some(advanced);
        Ok(())
    }
}
