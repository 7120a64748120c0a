// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stages: script tool detection and execution.
//!
//! Tools matched by trigger are partitioned by admission mode: `auto`
//! runs immediately, `confirm` is deferred for explicit approval,
//! `manual` is skipped unless named, `auto_approve_on_valid` runs and
//! then gates progression on the JSON `valid` field of its output.

use crate::context::ExecutionContext;
use crate::error::EngineError;
use crate::orchestrator::Engine;
use crate::response::EngineResponse;
use px_adapters::ScriptExecutor;
use px_command::args::value_text;
use px_core::{Clock, NotificationEvent, ScriptToolMode};

impl<S: ScriptExecutor, C: Clock + Clone> Engine<S, C> {
    pub(crate) fn stage_script_detection(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(), EngineError> {
        if ctx.state.normalization.response_only {
            return Ok(());
        }
        let parsed = ctx.parsed()?;
        let Some(prompt) = self.registries.prompts.get(&parsed.prompt_id) else {
            return Ok(());
        };
        let haystack = {
            let mut text = parsed.raw_args.clone();
            for value in parsed.prompt_args.values() {
                text.push(' ');
                text.push_str(&value_text(value));
            }
            text
        };
        let mut scripts = std::mem::take(&mut ctx.state.scripts);
        for tool in &prompt.script_tools {
            let matched =
                tool.triggers.is_empty() || tool.triggers.iter().any(|t| haystack.contains(t));
            if !matched {
                continue;
            }
            match tool.mode {
                ScriptToolMode::Auto => scripts.auto.push(tool.clone()),
                ScriptToolMode::Confirm => scripts.confirm.push(tool.clone()),
                ScriptToolMode::Manual => scripts.manual.push(tool.clone()),
                ScriptToolMode::AutoApproveOnValid => scripts.auto_approve.push(tool.clone()),
            }
        }
        ctx.state.scripts = scripts;
        Ok(())
    }

    pub(crate) async fn stage_script_execution(
        &self,
        ctx: &mut ExecutionContext,
    ) -> Result<(), EngineError> {
        if ctx.state.scripts.auto.is_empty() && ctx.state.scripts.auto_approve.is_empty() {
            return Ok(());
        }
        let args = ctx.parsed()?.prompt_args.clone();

        let auto = ctx.state.scripts.auto.clone();
        for tool in auto {
            let outcome = self.scripts.run(&tool, &args).await?;
            ctx.state.scripts.results.insert(tool.id.clone(), outcome);
        }

        let auto_approve = ctx.state.scripts.auto_approve.clone();
        for tool in auto_approve {
            let outcome = self.scripts.run(&tool, &args).await?;
            let valid = outcome.valid;
            ctx.state.scripts.results.insert(tool.id.clone(), outcome);
            if valid == Some(false) {
                let reason = format!("script tool '{}' rejected the input", tool.id);
                ctx.push_event(NotificationEvent::ResponseBlocked {
                    reason: reason.clone(),
                });
                let mut response = EngineResponse::error(reason);
                response.merge_metadata("blocked_by_tool", serde_json::json!(tool.id));
                ctx.response = Some(response);
                return Ok(());
            }
        }
        Ok(())
    }
}
