// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage: session management.
//!
//! Chain plans get a session blueprint: created on first contact,
//! restored on resume, replaced under `force_restart`.

use crate::context::{ExecutionContext, SessionContext};
use crate::error::EngineError;
use crate::orchestrator::Engine;
use px_adapters::ScriptExecutor;
use px_core::{ChainId, Clock, SessionBlueprint, SessionId};

impl<S: ScriptExecutor, C: Clock + Clone> Engine<S, C> {
    pub(crate) fn stage_session(&self, ctx: &mut ExecutionContext) -> Result<(), EngineError> {
        if !ctx.plan()?.requires_session {
            return Ok(());
        }

        // TTL housekeeping piggybacks on session traffic
        self.store.evict_expired();

        if ctx.state.session.restored_from_blueprint {
            if let Some(bp) = &ctx.blueprint {
                ctx.session_context = Some(session_context_of(bp));
            }
            return Ok(());
        }

        // A fresh command may still attach to an existing chain
        if let Some(chain_id) = ctx.request.chain_id.clone() {
            if ctx.request.force_restart {
                if let Some(existing) = self.store.get_by_chain_id(&chain_id, true) {
                    self.store.delete(existing.session_id.as_str())?;
                }
            } else if let Some(existing) = self.store.get_by_chain_id(&chain_id, true) {
                ctx.session_context = Some(session_context_of(&existing));
                ctx.blueprint = Some(existing);
                return Ok(());
            }
        }

        let parsed = ctx.parsed()?.clone();
        let plan = ctx.plan()?.clone();
        let now = self.clock.epoch_ms();
        let blueprint = SessionBlueprint {
            session_id: SessionId::new(self.id_gen.generate()),
            chain_id: ChainId::new(self.id_gen.generate()),
            parsed_command: parsed.clone(),
            execution_plan: plan,
            gate_instructions: ctx.state.gates.instructions.clone(),
            current_step: 1,
            total_steps: parsed.steps.len() as u32,
            previous_step_result: None,
            pending_review: false,
            review_attempts: 0,
            variables: Default::default(),
            created_at_ms: now,
            updated_at_ms: now,
        };
        self.store.put(blueprint.clone())?;
        ctx.session_context = Some(session_context_of(&blueprint));
        ctx.blueprint = Some(blueprint);
        Ok(())
    }
}

fn session_context_of(bp: &SessionBlueprint) -> SessionContext {
    SessionContext {
        session_id: bp.session_id.as_str().to_string(),
        chain_id: bp.chain_id.as_str().to_string(),
        current_step: bp.current_step,
        total_steps: bp.total_steps,
        previous_step_result: bp.previous_step_result.clone(),
        pending_review: bp.pending_review,
    }
}
