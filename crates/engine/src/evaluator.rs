// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gate evaluator.
//!
//! Given gates and rendered output, produce one [`ValidationResult`] per
//! gate. The evaluator never short-circuits: every criterion of every
//! gate is checked so retry hints are complete. Fail-on-any-blocking
//! semantics belong to the caller (the gate-review stage).

use crate::validators;
use px_adapters::run_shell_verify;
use px_core::{GateDefinition, GateType, PassCriterion};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Which criterion failed, e.g. `sections_present`
    pub field: String,
    pub message: String,
    pub code: String,
}

/// One gate's verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub gate_id: String,
    pub passed: bool,
    pub errors: Vec<ValidationIssue>,
    pub retry_hints: Vec<String>,
    /// Fraction of criteria passed, weighted by the completeness score
    pub score: f64,
}

/// Evaluate every gate against the content.
pub async fn evaluate_gates(
    gates: &[Arc<GateDefinition>],
    content: &str,
) -> Vec<ValidationResult> {
    let mut results = Vec::with_capacity(gates.len());
    for gate in gates {
        results.push(evaluate_gate(gate, content).await);
    }
    results
}

async fn evaluate_gate(gate: &GateDefinition, content: &str) -> ValidationResult {
    if gate.gate_type == GateType::Guidance {
        return ValidationResult {
            gate_id: gate.id.clone(),
            passed: true,
            errors: Vec::new(),
            retry_hints: Vec::new(),
            score: 1.0,
        };
    }

    let mut errors = Vec::new();
    let mut scores = Vec::new();
    for criterion in &gate.pass_criteria {
        let (field, outcome) = evaluate_criterion(criterion, content).await;
        match outcome {
            CriterionOutcome::Pass => scores.push(1.0),
            CriterionOutcome::Score(score) => {
                scores.push(score);
            }
            CriterionOutcome::Fail(message) => {
                scores.push(0.0);
                errors.push(ValidationIssue {
                    field: field.to_string(),
                    message,
                    code: format!("GATE_{}", field.to_ascii_uppercase()),
                });
            }
        }
    }

    let score = if scores.is_empty() {
        1.0
    } else {
        scores.iter().sum::<f64>() / scores.len() as f64
    };
    let passed = errors.is_empty();
    let mut retry_hints = Vec::new();
    if !passed {
        retry_hints.extend(gate.retry.improvement_hints.iter().cloned());
        for error in &errors {
            retry_hints.push(error.message.clone());
        }
        if !gate.guidance.is_empty() {
            retry_hints.push(gate.guidance.clone());
        }
    }

    ValidationResult {
        gate_id: gate.id.clone(),
        passed,
        errors,
        retry_hints,
        score,
    }
}

enum CriterionOutcome {
    Pass,
    Fail(String),
    /// Completeness-style criteria carry a score even on pass
    Score(f64),
}

async fn evaluate_criterion(
    criterion: &PassCriterion,
    content: &str,
) -> (&'static str, CriterionOutcome) {
    use CriterionOutcome::{Fail, Pass, Score};
    match criterion {
        PassCriterion::Format { format } => (
            "format",
            validators::check_format(content, *format).map_or(Pass, Fail),
        ),
        PassCriterion::SectionsPresent { sections } => (
            "sections_present",
            validators::check_sections(content, sections).map_or(Pass, Fail),
        ),
        PassCriterion::Hierarchy {
            require_h1,
            max_depth,
            forbid_consecutive,
        } => (
            "hierarchy",
            validators::check_hierarchy(content, *require_h1, *max_depth, *forbid_consecutive)
                .map_or(Pass, Fail),
        ),
        PassCriterion::CodeQuality { max_nesting } => (
            "code_quality",
            validators::check_code_quality(content, *max_nesting).map_or(Pass, Fail),
        ),
        PassCriterion::RequiredFields { fields } => (
            "required_fields",
            validators::check_required_fields(content, fields).map_or(Pass, Fail),
        ),
        PassCriterion::Completeness { min_score } => {
            let score = validators::completeness_score(content);
            let outcome = if score >= *min_score {
                Score(score)
            } else {
                Fail(format!(
                    "completeness score {score:.2} below required {min_score:.2}"
                ))
            };
            ("completeness", outcome)
        }
        PassCriterion::Security { tier } => (
            "security",
            validators::check_security(content, *tier).map_or(Pass, Fail),
        ),
        PassCriterion::PhrasePresent { phrases } => (
            "phrase_present",
            validators::check_phrases_present(content, phrases).map_or(Pass, Fail),
        ),
        PassCriterion::PhraseAbsent { phrases } => (
            "phrase_absent",
            validators::check_phrases_absent(content, phrases).map_or(Pass, Fail),
        ),
        PassCriterion::WordCount { min, max } => (
            "word_count",
            validators::check_word_count(content, *min, *max).map_or(Pass, Fail),
        ),
        PassCriterion::Shell { command } => {
            let outcome = match run_shell_verify(command).await {
                Ok(verdict) if verdict.passed => Pass,
                Ok(verdict) => Fail(format!(
                    "shell-verify command failed: {}",
                    verdict.stderr.trim()
                )),
                Err(e) => Fail(e.to_string()),
            };
            ("shell", outcome)
        }
        // Freeform criteria are judged by the caller of the model, not
        // here; the engine treats them as advisory text.
        PassCriterion::Criteria { .. } => ("criteria", Pass),
    }
}

#[cfg(test)]
#[path = "evaluator_tests.rs"]
mod tests;
