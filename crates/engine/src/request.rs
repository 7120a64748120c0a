// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The request envelope accepted by the engine.

use px_core::{GateAction, GateDefinition, InjectionAnnotations};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// An inline gate spec from the request's `gates` array: a registered ID,
/// a quick name/description pair, or a full definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InlineGateSpec {
    Registered(String),
    Quick { name: String, description: String },
    Full(GateDefinition),
}

/// A parsed `gate_verdict` field: `GATE_REVIEW: PASS|FAIL - reason`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    Pass,
    Fail { reason: String },
}

impl GateVerdict {
    /// Parse the freeform verdict text; anything unrecognized is `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix("GATE_REVIEW:")?.trim();
        let upper = rest.to_ascii_uppercase();
        if upper.starts_with("PASS") {
            return Some(GateVerdict::Pass);
        }
        if upper.starts_with("FAIL") {
            let reason = rest
                .splitn(2, '-')
                .nth(1)
                .map(str::trim)
                .unwrap_or("")
                .to_string();
            return Some(GateVerdict::Fail { reason });
        }
        None
    }
}

/// One execution request. `command` is required unless `chain_id` plus
/// `user_response` make this a response-only resume.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Resumption token from a prior chain response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
    /// The previous step's model output, for resumption
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_response: Option<String>,
    /// Freeform gate outcome text (`GATE_REVIEW: PASS|FAIL - reason`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_verdict: Option<String>,
    /// Resolution when a gate's retry budget is exhausted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate_action: Option<GateAction>,
    /// Inline gate specs applied on top of the plan
    #[serde(default)]
    pub gates: Vec<InlineGateSpec>,
    /// Ignore cached chain state
    #[serde(default)]
    pub force_restart: bool,
    /// Arbitrary key/value map merged into prompt args
    #[serde(default)]
    pub options: HashMap<String, Value>,
    /// Plan-time override for API validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_validation: Option<bool>,
    /// Explicitly requested gate IDs
    #[serde(default)]
    pub quality_gates: Vec<String>,
    /// Freeform inline criteria checked as an anonymous gate
    #[serde(default)]
    pub custom_checks: Vec<String>,
    /// Request-level injection overrides (hierarchy level 2)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub injection: Option<InjectionAnnotations>,
    /// Per-request deadline in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl ExecutionRequest {
    pub fn from_command(command: impl Into<String>) -> Self {
        Self {
            command: Some(command.into()),
            ..Self::default()
        }
    }

    pub fn resume(chain_id: impl Into<String>, user_response: impl Into<String>) -> Self {
        Self {
            chain_id: Some(chain_id.into()),
            user_response: Some(user_response.into()),
            ..Self::default()
        }
    }

    /// No command, but a chain ID and a user response: rehydrate from the
    /// session store instead of parsing.
    pub fn is_response_only(&self) -> bool {
        self.command.as_deref().map(str::trim).unwrap_or("").is_empty()
            && self.chain_id.is_some()
            && self.user_response.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_only_requires_chain_id_and_user_response() {
        assert!(ExecutionRequest::resume("c1", "output").is_response_only());
        assert!(!ExecutionRequest::from_command(">>greet").is_response_only());
        let partial = ExecutionRequest {
            chain_id: Some("c1".to_string()),
            ..ExecutionRequest::default()
        };
        assert!(!partial.is_response_only());
    }

    #[test]
    fn gate_verdict_parses_pass_and_fail() {
        assert_eq!(GateVerdict::parse("GATE_REVIEW: PASS"), Some(GateVerdict::Pass));
        assert_eq!(
            GateVerdict::parse("GATE_REVIEW: FAIL - missing sources"),
            Some(GateVerdict::Fail {
                reason: "missing sources".to_string()
            })
        );
        assert_eq!(GateVerdict::parse("looks fine to me"), None);
    }

    #[test]
    fn inline_gate_spec_deserializes_all_shapes() {
        let registered: InlineGateSpec = serde_json::from_str("\"quality\"").unwrap();
        assert_eq!(registered, InlineGateSpec::Registered("quality".to_string()));

        let quick: InlineGateSpec =
            serde_json::from_str(r#"{"name": "Cited", "description": "cite sources"}"#).unwrap();
        assert!(matches!(quick, InlineGateSpec::Quick { .. }));

        let full: InlineGateSpec =
            serde_json::from_str(r#"{"id": "g1", "name": "G1", "type": "validation"}"#).unwrap();
        assert!(matches!(full, InlineGateSpec::Full(_)));
    }
}
