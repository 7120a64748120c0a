// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Side-channel notification events.
//!
//! Emission is best-effort observability: events must never block the
//! pipeline and never surface errors back into a response.

use serde::{Deserialize, Serialize};

/// Events published to external observers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NotificationEvent {
    /// A validation gate rejected the model output
    GateFailed {
        gate_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chain_id: Option<String>,
        #[serde(default)]
        reasons: Vec<String>,
    },
    /// The active methodology changed
    FrameworkChanged {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        previous: Option<String>,
        current: String,
    },
    /// A chain step rendered successfully
    ChainStepComplete {
        chain_id: String,
        step: u32,
        total_steps: u32,
    },
    /// The final chain step rendered
    ChainComplete { chain_id: String },
    /// A gate's retry budget ran out
    RetryExhausted {
        gate_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chain_id: Option<String>,
        /// Resolved gate action, e.g. "abort"
        action: String,
    },
    /// A response was withheld (blocking gate, aborted chain)
    ResponseBlocked { reason: String },
}

impl NotificationEvent {
    /// Stable name for logging and adapters.
    pub fn name(&self) -> &'static str {
        match self {
            NotificationEvent::GateFailed { .. } => "gate_failed",
            NotificationEvent::FrameworkChanged { .. } => "framework_changed",
            NotificationEvent::ChainStepComplete { .. } => "chain_step_complete",
            NotificationEvent::ChainComplete { .. } => "chain_complete",
            NotificationEvent::RetryExhausted { .. } => "retry_exhausted",
            NotificationEvent::ResponseBlocked { .. } => "response_blocked",
        }
    }
}
