// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage: request normalization.

use crate::context::ExecutionContext;
use crate::error::EngineError;
use crate::orchestrator::Engine;
use px_adapters::ScriptExecutor;
use px_command::CommandParseError;
use px_core::Clock;

impl<S: ScriptExecutor, C: Clock + Clone> Engine<S, C> {
    /// Validate the request shape and lift the option map into state.
    pub(crate) fn stage_normalize(&self, ctx: &mut ExecutionContext) -> Result<(), EngineError> {
        if ctx.request.is_response_only() {
            ctx.state.normalization.response_only = true;
        } else if ctx
            .request
            .command
            .as_deref()
            .map(str::trim)
            .unwrap_or("")
            .is_empty()
        {
            return Err(EngineError::Parse(CommandParseError::MissingCommand));
        }
        ctx.state.normalization.options = ctx.request.options.clone();
        Ok(())
    }
}
