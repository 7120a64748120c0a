// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pipeline orchestrator.
//!
//! Drives the fixed stage sequence over one [`ExecutionContext`] per
//! request. Per-stage metrics are recorded under the request's
//! `command_id`; the deadline is checked between stages; a terminal
//! response short-circuits everything except the formatting,
//! notification, and cleanup tail.

use crate::context::ExecutionContext;
use crate::error::EngineError;
use crate::injection::InjectionConfig;
use crate::notify::NotificationSender;
use crate::request::ExecutionRequest;
use crate::response::EngineResponse;
use crate::stage::{PipelineStageMetric, StageKind, StageStatus, STAGE_SEQUENCE};
use parking_lot::Mutex;
use px_adapters::ScriptExecutor;
use px_core::{Clock, CommandId, IdGen, InjectionAnnotations, UuidIdGen};
use px_registry::RegistrySet;
use px_storage::SessionStore;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// Engine-wide configuration.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    /// Methodology applied when no `@` override is present
    pub default_framework: Option<String>,
    pub injection: InjectionConfig,
    /// Runtime argument defaults, consulted after declared defaults
    pub prompt_defaults: HashMap<String, Value>,
}

/// The prompt execution engine.
///
/// Shared across requests; each call to [`Engine::execute`] owns its own
/// context and never shares it.
pub struct Engine<S: ScriptExecutor, C: Clock + Clone> {
    pub(crate) registries: RegistrySet,
    pub(crate) store: Arc<SessionStore<C>>,
    pub(crate) scripts: S,
    pub(crate) notifications: NotificationSender,
    pub(crate) clock: C,
    pub(crate) config: EngineConfig,
    pub(crate) id_gen: Arc<dyn IdGen>,
    /// Level-1 injection override set through the admin surface
    pub(crate) runtime_injection_override: Mutex<Option<InjectionAnnotations>>,
}

impl<S: ScriptExecutor, C: Clock + Clone> Engine<S, C> {
    pub fn new(
        registries: RegistrySet,
        store: Arc<SessionStore<C>>,
        scripts: S,
        notifications: NotificationSender,
        clock: C,
        config: EngineConfig,
    ) -> Self {
        Self {
            registries,
            store,
            scripts,
            notifications,
            clock,
            config,
            id_gen: Arc::new(UuidIdGen),
            runtime_injection_override: Mutex::new(None),
        }
    }

    pub fn registries(&self) -> &RegistrySet {
        &self.registries
    }

    pub fn store(&self) -> &Arc<SessionStore<C>> {
        &self.store
    }

    /// Admin control surface: set or clear the session-level injection
    /// override (hierarchy level 1).
    pub fn set_runtime_injection_override(&self, override_: Option<InjectionAnnotations>) {
        *self.runtime_injection_override.lock() = override_;
    }

    /// Execute one request through the full pipeline.
    pub async fn execute(&self, request: ExecutionRequest) -> EngineResponse {
        let command_id = CommandId::new(self.id_gen.generate());
        let mut ctx = ExecutionContext::new(request, command_id.clone(), self.clock.epoch_ms());
        let mut metrics: Vec<PipelineStageMetric> = Vec::with_capacity(STAGE_SEQUENCE.len());

        for stage in STAGE_SEQUENCE {
            if ctx.response.is_some() && !stage.runs_after_terminal() {
                metrics.push(PipelineStageMetric {
                    stage,
                    status: StageStatus::Skipped,
                    duration_ms: 0,
                    error_message: None,
                });
                continue;
            }
            if ctx.deadline_exceeded() && !stage.runs_after_terminal() {
                tracing::warn!(command_id = %command_id, stage = stage.name(), "deadline exceeded");
                metrics.push(PipelineStageMetric {
                    stage,
                    status: StageStatus::Cancelled,
                    duration_ms: 0,
                    error_message: None,
                });
                ctx.response = Some(EngineError::Cancelled.into_response());
                continue;
            }

            let started = Instant::now();
            let result = self.run_stage(stage, &mut ctx).await;
            let duration_ms = started.elapsed().as_millis() as u64;
            match result {
                Ok(()) => {
                    tracing::debug!(
                        command_id = %command_id,
                        stage = stage.name(),
                        duration_ms,
                        "stage completed"
                    );
                    metrics.push(PipelineStageMetric {
                        stage,
                        status: StageStatus::Ok,
                        duration_ms,
                        error_message: None,
                    });
                }
                Err(error) => {
                    tracing::error!(
                        command_id = %command_id,
                        stage = stage.name(),
                        duration_ms,
                        error = %error,
                        "stage failed"
                    );
                    metrics.push(PipelineStageMetric {
                        stage,
                        status: StageStatus::Error,
                        duration_ms,
                        error_message: Some(error.to_string()),
                    });
                    ctx.response = Some(error.into_response());
                }
            }
        }

        let mut response = ctx.response.take().unwrap_or_else(|| {
            EngineError::Internal("pipeline produced no response".to_string()).into_response()
        });
        response.merge_metadata("command_id", serde_json::json!(command_id.as_str()));
        response.merge_metadata(
            "stage_metrics",
            serde_json::to_value(&metrics).unwrap_or(Value::Null),
        );
        response
    }

    async fn run_stage(
        &self,
        stage: StageKind,
        ctx: &mut ExecutionContext,
    ) -> Result<(), EngineError> {
        match stage {
            StageKind::RequestNormalization => self.stage_normalize(ctx),
            StageKind::SessionRehydration => self.stage_rehydrate(ctx),
            StageKind::CommandParsing => self.stage_parse(ctx),
            StageKind::ArgumentParsing => self.stage_arguments(ctx),
            StageKind::ExecutionPlanning => self.stage_plan(ctx),
            StageKind::ScriptDetection => self.stage_script_detection(ctx),
            StageKind::ScriptExecution => self.stage_script_execution(ctx).await,
            StageKind::FrameworkResolution => self.stage_framework(ctx),
            StageKind::GateEnhancement => self.stage_gate_enhancement(ctx),
            StageKind::InjectionControl => self.stage_injection(ctx),
            StageKind::SessionManagement => self.stage_session(ctx),
            StageKind::ResponseCapture => self.stage_capture(ctx),
            StageKind::GateReview => self.stage_review(ctx).await,
            StageKind::StepExecution => self.stage_execute(ctx).await,
            StageKind::SessionPersistence => self.stage_persist(ctx),
            StageKind::ResponseFormatting => self.stage_format(ctx),
            StageKind::NotificationEmission => self.stage_notify(ctx),
            StageKind::LifecycleCleanup => self.stage_cleanup(ctx),
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
