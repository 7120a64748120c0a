// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage: notification emission. Best-effort, after response assembly.

use crate::context::ExecutionContext;
use crate::error::EngineError;
use crate::orchestrator::Engine;
use px_adapters::ScriptExecutor;
use px_core::Clock;

impl<S: ScriptExecutor, C: Clock + Clone> Engine<S, C> {
    pub(crate) fn stage_notify(&self, ctx: &mut ExecutionContext) -> Result<(), EngineError> {
        for event in ctx.state.lifecycle.events.drain(..) {
            self.notifications.send(event);
        }
        Ok(())
    }
}
