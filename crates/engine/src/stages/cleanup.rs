// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage: lifecycle cleanup.
//!
//! Handlers registered on the context run after response assembly,
//! isolated from each other: a failure is logged and the rest still run.

use crate::context::ExecutionContext;
use crate::error::EngineError;
use crate::orchestrator::Engine;
use px_adapters::ScriptExecutor;
use px_core::Clock;

impl<S: ScriptExecutor, C: Clock + Clone> Engine<S, C> {
    pub(crate) fn stage_cleanup(&self, ctx: &mut ExecutionContext) -> Result<(), EngineError> {
        let handlers = std::mem::take(&mut ctx.state.lifecycle.cleanup);
        let total = handlers.len();
        for (i, handler) in handlers.into_iter().enumerate() {
            if let Err(message) = handler() {
                tracing::warn!(
                    command_id = %ctx.command_id,
                    handler = i,
                    total,
                    %message,
                    "cleanup handler failed"
                );
            }
        }
        Ok(())
    }
}
