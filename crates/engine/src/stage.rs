// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The fixed stage sequence and per-stage metrics.

use serde::{Deserialize, Serialize};

/// Every pipeline stage, in declaration order.
///
/// The sequence is total: stage *n+1* begins only after stage *n*
/// returns. Stages flagged [`StageKind::runs_after_terminal`] still run
/// once a terminal response is set; everything else is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    RequestNormalization,
    SessionRehydration,
    CommandParsing,
    ArgumentParsing,
    ExecutionPlanning,
    ScriptDetection,
    ScriptExecution,
    FrameworkResolution,
    GateEnhancement,
    InjectionControl,
    SessionManagement,
    ResponseCapture,
    GateReview,
    StepExecution,
    SessionPersistence,
    ResponseFormatting,
    NotificationEmission,
    LifecycleCleanup,
}

/// The declared pipeline order.
pub const STAGE_SEQUENCE: [StageKind; 18] = [
    StageKind::RequestNormalization,
    StageKind::SessionRehydration,
    StageKind::CommandParsing,
    StageKind::ArgumentParsing,
    StageKind::ExecutionPlanning,
    StageKind::ScriptDetection,
    StageKind::ScriptExecution,
    StageKind::FrameworkResolution,
    StageKind::GateEnhancement,
    StageKind::InjectionControl,
    StageKind::SessionManagement,
    StageKind::ResponseCapture,
    StageKind::GateReview,
    StageKind::StepExecution,
    StageKind::SessionPersistence,
    StageKind::ResponseFormatting,
    StageKind::NotificationEmission,
    StageKind::LifecycleCleanup,
];

impl StageKind {
    /// Stable name for logs and metrics.
    pub fn name(self) -> &'static str {
        match self {
            StageKind::RequestNormalization => "request_normalization",
            StageKind::SessionRehydration => "session_rehydration",
            StageKind::CommandParsing => "command_parsing",
            StageKind::ArgumentParsing => "argument_parsing",
            StageKind::ExecutionPlanning => "execution_planning",
            StageKind::ScriptDetection => "script_detection",
            StageKind::ScriptExecution => "script_execution",
            StageKind::FrameworkResolution => "framework_resolution",
            StageKind::GateEnhancement => "gate_enhancement",
            StageKind::InjectionControl => "injection_control",
            StageKind::SessionManagement => "session_management",
            StageKind::ResponseCapture => "response_capture",
            StageKind::GateReview => "gate_review",
            StageKind::StepExecution => "step_execution",
            StageKind::SessionPersistence => "session_persistence",
            StageKind::ResponseFormatting => "response_formatting",
            StageKind::NotificationEmission => "notification_emission",
            StageKind::LifecycleCleanup => "lifecycle_cleanup",
        }
    }

    /// Whether this stage still runs after a terminal response is set.
    pub fn runs_after_terminal(self) -> bool {
        matches!(
            self,
            StageKind::ResponseFormatting
                | StageKind::NotificationEmission
                | StageKind::LifecycleCleanup
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Ok,
    Skipped,
    Error,
    Cancelled,
}

/// One stage's observation, grouped per request by `command_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStageMetric {
    pub stage: StageKind,
    pub status: StageStatus,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}
