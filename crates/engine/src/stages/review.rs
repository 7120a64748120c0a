// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage: gate review.
//!
//! Validation gates judge the captured `user_response`. All pass: the
//! chain proceeds. Any blocking failure: the step is parked in
//! `pending_review` and a retry response (guidance, failure reasons,
//! `gate_verdict` instructions) short-circuits the pipeline. When the
//! retry budget runs out, the request's `gate_action` resolves the step:
//! retry once more, skip the gate, or abort the chain (the default).

use crate::context::ExecutionContext;
use crate::error::EngineError;
use crate::evaluator::{evaluate_gates, ValidationResult};
use crate::orchestrator::Engine;
use crate::request::GateVerdict;
use crate::response::EngineResponse;
use px_adapters::ScriptExecutor;
use px_core::{Clock, GateAction, NotificationEvent};

impl<S: ScriptExecutor, C: Clock + Clone> Engine<S, C> {
    pub(crate) async fn stage_review(&self, ctx: &mut ExecutionContext) -> Result<(), EngineError> {
        let Some(captured) = ctx.state.session.captured_response.clone() else {
            return Ok(());
        };
        let blocking: Vec<_> = ctx
            .state
            .gates
            .definitions
            .iter()
            .filter(|d| d.is_blocking())
            .cloned()
            .collect();
        if blocking.is_empty() {
            return Ok(());
        }

        // An explicit verdict from the caller overrides engine evaluation
        let failed: Vec<ValidationResult> = match ctx
            .request
            .gate_verdict
            .as_deref()
            .and_then(GateVerdict::parse)
        {
            Some(GateVerdict::Pass) => Vec::new(),
            Some(GateVerdict::Fail { reason }) => blocking
                .iter()
                .map(|g| ValidationResult {
                    gate_id: g.id.clone(),
                    passed: false,
                    errors: Vec::new(),
                    retry_hints: vec![reason.clone()],
                    score: 0.0,
                })
                .collect(),
            None => evaluate_gates(&blocking, &captured)
                .await
                .into_iter()
                .filter(|r| !r.passed)
                .collect(),
        };

        if failed.is_empty() {
            if let Some(bp) = ctx.blueprint.as_mut() {
                bp.pending_review = false;
                bp.review_attempts = 0;
            }
            return Ok(());
        }

        let chain_id = ctx
            .blueprint
            .as_ref()
            .map(|bp| bp.chain_id.as_str().to_string());
        for result in &failed {
            ctx.push_event(NotificationEvent::GateFailed {
                gate_id: result.gate_id.clone(),
                chain_id: chain_id.clone(),
                reasons: result.retry_hints.clone(),
            });
        }

        let max_attempts = blocking
            .iter()
            .filter(|g| failed.iter().any(|f| f.gate_id == g.id))
            .map(|g| g.retry.max_attempts)
            .max()
            .unwrap_or(2);
        let attempts = ctx
            .blueprint
            .as_ref()
            .map(|bp| bp.review_attempts + 1)
            .unwrap_or(1);

        if attempts <= max_attempts {
            self.park_for_retry(ctx, &failed, attempts)?;
            return Ok(());
        }

        // Retry budget exhausted; `gate_action` decides (absent = abort)
        let action = ctx.request.gate_action.unwrap_or_default();
        for result in &failed {
            ctx.push_event(NotificationEvent::RetryExhausted {
                gate_id: result.gate_id.clone(),
                chain_id: chain_id.clone(),
                action: format!("{action:?}").to_ascii_lowercase(),
            });
        }
        match action {
            GateAction::Retry => {
                // One more round: reset the counter and park again
                if let Some(bp) = ctx.blueprint.as_mut() {
                    bp.review_attempts = 0;
                }
                self.park_for_retry(ctx, &failed, 1)?;
                Ok(())
            }
            GateAction::Skip => {
                ctx.state.session.review_skipped = true;
                if let Some(bp) = ctx.blueprint.as_mut() {
                    bp.pending_review = false;
                    bp.review_attempts = 0;
                }
                tracing::warn!(gates = failed.len(), "gate review skipped by request");
                Ok(())
            }
            GateAction::Abort => {
                let gate_ids: Vec<String> =
                    failed.iter().map(|f| f.gate_id.clone()).collect();
                if let Some(bp) = &ctx.blueprint {
                    self.store.delete(bp.session_id.as_str())?;
                }
                ctx.push_event(NotificationEvent::ResponseBlocked {
                    reason: format!("chain aborted: gates failed ({})", gate_ids.join(", ")),
                });
                let mut response = EngineResponse::error(format!(
                    "chain aborted: gate review failed after {max_attempts} attempts ({})",
                    gate_ids.join(", ")
                ));
                response.merge_metadata("gate_action", serde_json::json!("abort"));
                response.merge_metadata("failed_gates", serde_json::json!(gate_ids));
                ctx.response = Some(response);
                Ok(())
            }
        }
    }

    /// Park the chain in pending review. The execution stage then
    /// re-renders the current step and the formatting stage prepends the
    /// failure report, so the retry response repeats the failed step's
    /// prompt alongside the gate guidance.
    fn park_for_retry(
        &self,
        ctx: &mut ExecutionContext,
        failed: &[ValidationResult],
        attempts: u32,
    ) -> Result<(), EngineError> {
        ctx.state.session.pending_review = true;
        if let Some(bp) = ctx.blueprint.as_mut() {
            bp.pending_review = true;
            bp.review_attempts = attempts;
            self.store.put(bp.clone())?;
        }

        let mut body = String::from("Gate review failed. Revise the previous response.\n");
        for result in failed {
            body.push_str(&format!("\n## Gate: {}\n", result.gate_id));
            for error in &result.errors {
                body.push_str(&format!("- {}\n", error.message));
            }
            for hint in &result.retry_hints {
                body.push_str(&format!("- hint: {hint}\n"));
            }
        }

        ctx.state.gates.review_failure = Some(body);
        ctx.state.gates.review_attempt = attempts;
        ctx.state.gates.review_failed_gates =
            failed.iter().map(|f| f.gate_id.clone()).collect();
        ctx.state.gates.review_hints = failed
            .iter()
            .flat_map(|f| f.retry_hints.iter().cloned())
            .collect();
        Ok(())
    }
}
