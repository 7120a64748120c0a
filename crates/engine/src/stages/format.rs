// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage: response formatting.
//!
//! Assembles the final payload from the execution results, or decorates
//! an already-terminal response (gate-review retries get resubmission
//! instructions; everything chain-scoped gets its chain metadata).

use crate::context::ExecutionContext;
use crate::error::EngineError;
use crate::orchestrator::Engine;
use crate::response::EngineResponse;
use px_adapters::ScriptExecutor;
use px_core::Clock;

impl<S: ScriptExecutor, C: Clock + Clone> Engine<S, C> {
    pub(crate) fn stage_format(&self, ctx: &mut ExecutionContext) -> Result<(), EngineError> {
        let chain_id = ctx_chain_id(ctx);
        let pending_review = ctx.state.session.pending_review;
        if let Some(response) = ctx.response.as_mut() {
            decorate_terminal(response, chain_id, pending_review);
            return Ok(());
        }

        let results = ctx
            .execution_results
            .as_ref()
            .ok_or_else(|| EngineError::Internal("no execution results to format".into()))?;
        let content = match &ctx.state.gates.review_failure {
            Some(failure) if ctx.state.session.pending_review => {
                format!("{failure}\n---\n\n{}", results.content)
            }
            _ => results.content.clone(),
        };
        let mut response = EngineResponse::text(content);
        if let Some(map) = results.metadata.as_object() {
            for (k, v) in map {
                response.merge_metadata(k, v.clone());
            }
        }
        if ctx.state.session.pending_review {
            response.merge_metadata("pending_review", serde_json::json!(true));
            response.merge_metadata(
                "review_attempt",
                serde_json::json!(ctx.state.gates.review_attempt),
            );
            response.merge_metadata(
                "failed_gates",
                serde_json::json!(ctx.state.gates.review_failed_gates),
            );
            response.merge_metadata(
                "improvement_hints",
                serde_json::json!(ctx.state.gates.review_hints),
            );
            if let Some(block) = response.content.first_mut() {
                block.text.push_str(
                    "\n\nResubmit a revised `user_response`, or a `gate_verdict` of the form \
                     `GATE_REVIEW: PASS|FAIL - reason`.",
                );
            }
        }

        if !ctx.state.scripts.confirm.is_empty() {
            let pending: Vec<String> = ctx
                .state
                .scripts
                .confirm
                .iter()
                .map(|t| t.id.clone())
                .collect();
            response.merge_metadata("pending_confirmation", serde_json::json!(pending));
        }

        let is_chain = ctx
            .execution_plan
            .as_ref()
            .map(|p| p.is_chain())
            .unwrap_or(false);
        if is_chain {
            if let Some(session) = &ctx.session_context {
                response.merge_metadata("chain_id", serde_json::json!(session.chain_id));
                response.merge_metadata("session_id", serde_json::json!(session.session_id));
                response.merge_metadata("total_steps", serde_json::json!(session.total_steps));
            }
            let target = ctx.state.session.target_step.unwrap_or(1);
            response.merge_metadata("current_step", serde_json::json!(target));

            if ctx.state.session.chain_complete {
                response.merge_metadata("chain_complete", serde_json::json!(true));
            } else if let Some(session) = &ctx.session_context {
                let step_prompt = ctx
                    .parsed_command
                    .as_ref()
                    .and_then(|p| p.steps.get(target.saturating_sub(1) as usize))
                    .map(|s| s.prompt_id.clone())
                    .unwrap_or_default();
                let call_to_action = format!(
                    "Next: submit `user_response` for step {target} of {} ({step_prompt}) with chain_id `{}`.",
                    session.total_steps, session.chain_id
                );
                if let Some(block) = response.content.first_mut() {
                    block.text.push_str(&format!("\n\n---\n{call_to_action}"));
                }
                response.merge_metadata("call_to_action", serde_json::json!(call_to_action));
            }
        }

        ctx.response = Some(response);
        Ok(())
    }
}

fn ctx_chain_id(ctx: &ExecutionContext) -> Option<String> {
    ctx.blueprint
        .as_ref()
        .map(|bp| bp.chain_id.as_str().to_string())
}

/// Add resubmission instructions and chain identity to an
/// already-terminal response.
fn decorate_terminal(
    response: &mut EngineResponse,
    chain_id: Option<String>,
    pending_review: bool,
) {
    if let Some(chain_id) = &chain_id {
        response.merge_metadata("chain_id", serde_json::json!(chain_id));
    }
    if pending_review {
        let suffix = match &chain_id {
            Some(id) => format!(
                "\n\nResubmit with chain_id `{id}`: provide a revised `user_response`, or a \
                 `gate_verdict` of the form `GATE_REVIEW: PASS|FAIL - reason`."
            ),
            None => "\n\nResubmit a revised `user_response` or a `gate_verdict` of the form \
                     `GATE_REVIEW: PASS|FAIL - reason`."
                .to_string(),
        };
        if let Some(block) = response.content.first_mut() {
            block.text.push_str(&suffix);
        }
    }
}
