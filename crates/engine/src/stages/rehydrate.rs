// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage: session rehydration.
//!
//! A response-only request skips parsing: the blueprint stored at chain
//! start is the source of `parsed_command` and `execution_plan`, restored
//! bit-identically.

use crate::context::ExecutionContext;
use crate::error::EngineError;
use crate::orchestrator::Engine;
use px_adapters::ScriptExecutor;
use px_core::Clock;

impl<S: ScriptExecutor, C: Clock + Clone> Engine<S, C> {
    pub(crate) fn stage_rehydrate(&self, ctx: &mut ExecutionContext) -> Result<(), EngineError> {
        if !ctx.state.normalization.response_only {
            return Ok(());
        }
        let chain_id = ctx
            .request
            .chain_id
            .clone()
            .ok_or_else(|| EngineError::Internal("response-only request without chain_id".into()))?;
        let blueprint = self
            .store
            .get_by_chain_id(&chain_id, true)
            .ok_or_else(|| EngineError::SessionNotFound(chain_id.clone()))?;

        // Completed chains are purged on the next touch
        if blueprint.is_complete() {
            let _ = self.store.delete(blueprint.session_id.as_str());
            return Err(EngineError::SessionNotFound(chain_id));
        }

        ctx.parsed_command = Some(blueprint.parsed_command.clone());
        ctx.execution_plan = Some(blueprint.execution_plan.clone());
        ctx.blueprint = Some(blueprint);
        ctx.state.session.restored_from_blueprint = true;
        Ok(())
    }
}
