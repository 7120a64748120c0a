// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage: execution planning. The only stage that populates
//! `execution_plan` (blueprint rehydration aside).

use crate::context::ExecutionContext;
use crate::error::EngineError;
use crate::orchestrator::Engine;
use crate::planner::build_plan;
use px_adapters::ScriptExecutor;
use px_core::Clock;

impl<S: ScriptExecutor, C: Clock + Clone> Engine<S, C> {
    pub(crate) fn stage_plan(&self, ctx: &mut ExecutionContext) -> Result<(), EngineError> {
        if ctx.state.normalization.response_only {
            // Plan restored from the blueprint
            return Ok(());
        }
        let parsed = ctx.parsed()?;
        let plan = build_plan(parsed, &self.registries, &ctx.request)?;
        ctx.execution_plan = Some(plan);
        Ok(())
    }
}
