// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage: command parsing. The only stage (besides blueprint
//! rehydration) that populates `parsed_command`.

use crate::context::ExecutionContext;
use crate::error::EngineError;
use crate::orchestrator::Engine;
use px_adapters::ScriptExecutor;
use px_command::parse_command;
use px_core::Clock;

impl<S: ScriptExecutor, C: Clock + Clone> Engine<S, C> {
    pub(crate) fn stage_parse(&self, ctx: &mut ExecutionContext) -> Result<(), EngineError> {
        if ctx.state.normalization.response_only {
            return Ok(());
        }
        let command = ctx.request.command.clone().unwrap_or_default();
        let parsed = parse_command(&command, &self.registries)?;
        ctx.parsed_command = Some(parsed);
        Ok(())
    }
}
