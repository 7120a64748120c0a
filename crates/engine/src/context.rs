// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-request execution context.
//!
//! One mutable bag threaded through the stage sequence, owned exclusively
//! by the pipeline driving it. Stages mutate it freely; it is never shared
//! with another request. Writer discipline: `parsed_command` is populated
//! by the parsing stages (or blueprint rehydration), `execution_plan` by
//! the planning stage, `execution_results` by the step-execution stage.

use crate::injection::{InjectionDecision, InjectionType};
use crate::request::ExecutionRequest;
use crate::response::EngineResponse;
use px_adapters::ScriptOutcome;
use px_core::{
    CommandId, ExecutionPlan, GateDefinition, NotificationEvent, ParsedCommand, ScriptTool,
    SessionBlueprint,
};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Output of the step-execution stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResults {
    pub content: String,
    pub metadata: Value,
    pub generated_at_ms: u64,
}

/// The active methodology, resolved by the framework stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameworkContext {
    pub framework_id: String,
    /// Fully rendered system prompt for this request
    pub system_prompt: String,
    /// Literal marker scanned for when avoiding double injection
    pub marker: String,
}

/// Chain session view exposed to later stages and response metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub session_id: String,
    pub chain_id: String,
    pub current_step: u32,
    pub total_steps: u32,
    pub previous_step_result: Option<String>,
    pub pending_review: bool,
}

/// Request options extracted by the normalization stage.
#[derive(Debug, Clone, Default)]
pub struct NormalizationState {
    pub response_only: bool,
    pub options: HashMap<String, Value>,
}

/// Current injection decisions, keyed by injection type.
#[derive(Debug, Clone, Default)]
pub struct InjectionState {
    pub decisions: HashMap<InjectionType, InjectionDecision>,
}

impl InjectionState {
    /// Whether the given injection type applies; false until resolved.
    pub fn inject(&self, injection_type: InjectionType) -> bool {
        self.decisions
            .get(&injection_type)
            .map(|d| d.inject)
            .unwrap_or(false)
    }
}

/// Session-related flags accumulated across stages.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub restored_from_blueprint: bool,
    pub chain_complete: bool,
    /// `user_response` captured as the previous step's result
    pub captured_response: Option<String>,
    pub pending_review: bool,
    /// The 1-based step the execution stage rendered (or found complete)
    pub target_step: Option<u32>,
    /// Review outcome forced by `gate_action: skip`
    pub review_skipped: bool,
}

/// Gates accumulated for the current request.
#[derive(Debug, Clone, Default)]
pub struct GateState {
    pub accumulated_gate_ids: Vec<String>,
    pub definitions: Vec<Arc<GateDefinition>>,
    /// Rendered gate guidance text
    pub instructions: Option<String>,
    /// Failure report when the review stage parked the step for retry
    pub review_failure: Option<String>,
    pub review_hints: Vec<String>,
    pub review_failed_gates: Vec<String>,
    pub review_attempt: u32,
}

/// Script tools detected and executed for this request.
#[derive(Debug, Clone, Default)]
pub struct ScriptState {
    pub auto: Vec<ScriptTool>,
    pub confirm: Vec<ScriptTool>,
    pub manual: Vec<ScriptTool>,
    pub auto_approve: Vec<ScriptTool>,
    pub results: HashMap<String, ScriptOutcome>,
}

/// Cleanup handler run after response assembly, isolated from the others.
pub type CleanupHandler = Box<dyn FnOnce() -> Result<(), String> + Send>;

/// End-of-request bookkeeping.
#[derive(Default)]
pub struct LifecycleState {
    pub cleanup: Vec<CleanupHandler>,
    /// Events queued for the notification stage
    pub events: Vec<NotificationEvent>,
}

/// Structured state sub-object of the context.
#[derive(Default)]
pub struct ContextState {
    pub normalization: NormalizationState,
    pub injection: InjectionState,
    pub session: SessionState,
    pub gates: GateState,
    pub scripts: ScriptState,
    pub lifecycle: LifecycleState,
}

/// The shared mutable context for one request.
pub struct ExecutionContext {
    pub request: ExecutionRequest,
    /// Groups this request's stage metrics
    pub command_id: CommandId,
    pub started_at_ms: u64,
    pub deadline: Option<Instant>,
    pub parsed_command: Option<ParsedCommand>,
    pub execution_plan: Option<ExecutionPlan>,
    pub framework_context: Option<FrameworkContext>,
    pub session_context: Option<SessionContext>,
    /// Working copy of the session blueprint for the session stages
    pub blueprint: Option<SessionBlueprint>,
    pub execution_results: Option<ExecutionResults>,
    /// Terminal sentinel: once set, remaining stages skip their work
    pub response: Option<EngineResponse>,
    pub state: ContextState,
}

impl ExecutionContext {
    pub fn new(request: ExecutionRequest, command_id: CommandId, started_at_ms: u64) -> Self {
        let deadline = request
            .timeout_ms
            .map(|ms| Instant::now() + std::time::Duration::from_millis(ms));
        Self {
            request,
            command_id,
            started_at_ms,
            deadline,
            parsed_command: None,
            execution_plan: None,
            framework_context: None,
            session_context: None,
            blueprint: None,
            execution_results: None,
            response: None,
            state: ContextState::default(),
        }
    }

    pub fn deadline_exceeded(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Queue a notification event for the emission stage.
    pub fn push_event(&mut self, event: NotificationEvent) {
        self.state.lifecycle.events.push(event);
    }

    /// Register a cleanup handler run after response assembly.
    pub fn on_cleanup(&mut self, handler: impl FnOnce() -> Result<(), String> + Send + 'static) {
        self.state.lifecycle.cleanup.push(Box::new(handler));
    }

    /// The parsed command, or an internal fault if a stage ran out of order.
    pub fn parsed(&self) -> Result<&ParsedCommand, crate::error::EngineError> {
        self.parsed_command
            .as_ref()
            .ok_or_else(|| crate::error::EngineError::Internal("parsed command not set".into()))
    }

    pub fn plan(&self) -> Result<&ExecutionPlan, crate::error::EngineError> {
        self.execution_plan
            .as_ref()
            .ok_or_else(|| crate::error::EngineError::Internal("execution plan not set".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ExecutionRequest;

    #[test]
    fn fresh_context_has_no_artifacts() {
        let ctx = ExecutionContext::new(
            ExecutionRequest::from_command(">>greet"),
            CommandId::new("cmd-1"),
            0,
        );
        assert!(ctx.parsed_command.is_none());
        assert!(ctx.execution_plan.is_none());
        assert!(ctx.response.is_none());
        assert!(ctx.parsed().is_err());
        assert!(ctx.plan().is_err());
    }

    #[test]
    fn deadline_from_timeout_ms() {
        let mut request = ExecutionRequest::from_command(">>greet");
        request.timeout_ms = Some(0);
        let ctx = ExecutionContext::new(request, CommandId::new("cmd-1"), 0);
        assert!(ctx.deadline_exceeded());

        let ctx = ExecutionContext::new(
            ExecutionRequest::from_command(">>greet"),
            CommandId::new("cmd-2"),
            0,
        );
        assert!(!ctx.deadline_exceeded());
    }

    #[test]
    fn injection_state_defaults_to_no_injection() {
        let state = InjectionState::default();
        assert!(!state.inject(InjectionType::SystemPrompt));
    }
}
