// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage: response capture.
//!
//! A resume request carries the previous step's model output; capture it
//! for the review and execution stages. Advancement is committed by the
//! persistence stage only after review passes.

use crate::context::ExecutionContext;
use crate::error::EngineError;
use crate::orchestrator::Engine;
use px_adapters::ScriptExecutor;
use px_core::Clock;

impl<S: ScriptExecutor, C: Clock + Clone> Engine<S, C> {
    pub(crate) fn stage_capture(&self, ctx: &mut ExecutionContext) -> Result<(), EngineError> {
        if !ctx.state.normalization.response_only {
            return Ok(());
        }
        ctx.state.session.captured_response = ctx.request.user_response.clone();
        Ok(())
    }
}
