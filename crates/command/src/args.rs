// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Argument parsing: raw payload text to a typed argument map.
//!
//! The first applicable strategy wins: JSON, key-value, simple-text,
//! fallback. A schema-validation pass then applies each argument's
//! declared constraints.

use indexmap::IndexMap;
use px_core::{ArgumentSpec, ArgumentType, PromptDefinition};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;

// Allow expect here as the regexes are compile-time verified to be valid
#[allow(clippy::expect_used)]
static KV_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w-]+\s*[=:]\s*").expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static KV_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([\w-]+)\s*[=:]\s*("(?:[^"\\]|\\.)*"|'[^']*'|\S+)"#)
        .expect("constant regex pattern is valid")
});

#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\[.*to be provided.*\]$").expect("constant regex pattern is valid")
});

/// Names an argument blob is mapped onto, most preferred first.
const SEMANTIC_PRIORITY: &[&str] = &[
    "content", "text", "input", "query", "topic", "message", "question", "task", "code",
];

/// How a raw payload is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStrategy {
    Json,
    KeyValue,
    SimpleText,
    Fallback,
}

/// Where an argument's final value came from, for observability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgumentSource {
    UserProvided,
    UserProvidedSmartMapped,
    DeclaredDefault,
    PromptDefaults,
    Environment,
    EmptyFallback,
}

/// Typed argument map plus per-argument provenance.
#[derive(Debug, Clone, Default)]
pub struct ParsedArguments {
    pub values: IndexMap<String, Value>,
    pub sources: HashMap<String, ArgumentSource>,
    pub strategy: Option<ParseStrategy>,
}

/// Machine-readable constraint that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueCode {
    #[serde(rename = "REQUIRED_ARGUMENT_MISSING")]
    RequiredArgumentMissing,
    #[serde(rename = "PATTERN_MISMATCH")]
    PatternMismatch,
    #[serde(rename = "LENGTH_BOUND")]
    LengthBound,
}

impl std::fmt::Display for IssueCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IssueCode::RequiredArgumentMissing => "REQUIRED_ARGUMENT_MISSING",
            IssueCode::PatternMismatch => "PATTERN_MISMATCH",
            IssueCode::LengthBound => "LENGTH_BOUND",
        };
        write!(f, "{s}")
    }
}

/// One failed constraint on one argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentIssue {
    pub argument: String,
    pub code: IssueCode,
    pub message: String,
    /// A legal example value the caller can copy
    pub example: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("argument validation failed: {}", summarize(.issues))]
    Validation { issues: Vec<ArgumentIssue> },
}

fn summarize(issues: &[ArgumentIssue]) -> String {
    issues
        .iter()
        .map(|i| format!("{} {}", i.code, i.argument))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Runtime context consulted for argument defaults.
#[derive(Debug, Clone, Default)]
pub struct ArgumentContext {
    /// Runtime prompt defaults, consulted after the declared default
    pub prompt_defaults: HashMap<String, Value>,
}

/// Select the first applicable parsing strategy.
pub fn select_strategy(raw: &str, prompt: &PromptDefinition) -> ParseStrategy {
    let t = raw.trim();
    if (t.starts_with('{') && t.ends_with('}')) || (t.starts_with('[') && t.ends_with(']')) {
        ParseStrategy::Json
    } else if KV_HEAD.is_match(t) {
        ParseStrategy::KeyValue
    } else if !t.is_empty() && !prompt.arguments.is_empty() {
        ParseStrategy::SimpleText
    } else {
        ParseStrategy::Fallback
    }
}

/// Parse raw argument text against a prompt's schema.
pub fn parse_arguments(
    raw: &str,
    prompt: &PromptDefinition,
    ctx: &ArgumentContext,
) -> Result<ParsedArguments, ArgumentError> {
    let strategy = select_strategy(raw, prompt);
    let mut parsed = ParsedArguments {
        strategy: Some(strategy),
        ..ParsedArguments::default()
    };

    match strategy {
        ParseStrategy::Json => parse_json(raw.trim(), prompt, &mut parsed),
        ParseStrategy::KeyValue => parse_key_value(raw, &mut parsed),
        ParseStrategy::SimpleText => parse_simple_text(raw.trim(), prompt, &mut parsed),
        ParseStrategy::Fallback => {}
    }

    // Coerce values toward their declared (or inferred) types
    for spec in &prompt.arguments {
        if let Some(value) = parsed.values.get(&spec.name) {
            let coerced = coerce(value.clone(), spec);
            parsed.values.insert(spec.name.clone(), coerced);
        }
    }

    apply_defaults(prompt, ctx, &mut parsed);

    let issues = validate(prompt, &parsed);
    if issues.is_empty() {
        Ok(parsed)
    } else {
        Err(ArgumentError::Validation { issues })
    }
}

/// Parse raw payload text into typed values without applying defaults or
/// schema validation. Chain step payloads go through this path; they are
/// validated when the step renders.
pub fn parse_raw_values(raw: &str, prompt: &PromptDefinition) -> IndexMap<String, Value> {
    let strategy = select_strategy(raw, prompt);
    let mut parsed = ParsedArguments {
        strategy: Some(strategy),
        ..ParsedArguments::default()
    };
    match strategy {
        ParseStrategy::Json => parse_json(raw.trim(), prompt, &mut parsed),
        ParseStrategy::KeyValue => parse_key_value(raw, &mut parsed),
        ParseStrategy::SimpleText => parse_simple_text(raw.trim(), prompt, &mut parsed),
        ParseStrategy::Fallback => {}
    }
    for spec in &prompt.arguments {
        if let Some(value) = parsed.values.get(&spec.name) {
            let coerced = coerce(value.clone(), spec);
            parsed.values.insert(spec.name.clone(), coerced);
        }
    }
    parsed.values
}

fn parse_json(raw: &str, prompt: &PromptDefinition, out: &mut ParsedArguments) {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => {
            for (k, v) in map {
                out.values.insert(k.clone(), v);
                out.sources.insert(k, ArgumentSource::UserProvided);
            }
        }
        Ok(Value::Array(items)) => {
            // Positional assignment against the declared argument order
            for (spec, item) in prompt.arguments.iter().zip(items) {
                out.values.insert(spec.name.clone(), item);
                out.sources
                    .insert(spec.name.clone(), ArgumentSource::UserProvided);
            }
        }
        Ok(other) => {
            tracing::debug!(?other, "json payload was not an object or array");
        }
        Err(e) => {
            tracing::debug!(error = %e, "json payload failed to parse; leaving args empty");
        }
    }
}

fn parse_key_value(raw: &str, out: &mut ParsedArguments) {
    for caps in KV_PAIR.captures_iter(raw) {
        let key = caps[1].to_string();
        let value = unquote(&caps[2]);
        out.values.insert(key.clone(), Value::String(value));
        out.sources.insert(key, ArgumentSource::UserProvided);
    }
}

fn parse_simple_text(raw: &str, prompt: &PromptDefinition, out: &mut ParsedArguments) {
    let missing: Vec<&ArgumentSpec> = prompt
        .arguments
        .iter()
        .filter(|a| !out.values.contains_key(&a.name))
        .collect();
    let Some((target, smart)) = pick_blob_target(&missing) else {
        return;
    };
    out.values
        .insert(target.name.clone(), Value::String(raw.to_string()));
    out.sources.insert(
        target.name.clone(),
        if smart {
            ArgumentSource::UserProvidedSmartMapped
        } else {
            ArgumentSource::UserProvided
        },
    );
}

/// Choose which argument a bare text blob binds to.
///
/// Single-argument prompts take the blob directly. With several candidates
/// the semantic priority list picks the best match by name then
/// description; ties fall back to declaration order. Returns whether the
/// choice was smart-mapped.
fn pick_blob_target<'a>(missing: &[&'a ArgumentSpec]) -> Option<(&'a ArgumentSpec, bool)> {
    match missing {
        [] => None,
        [only] => Some((*only, false)),
        several => {
            for keyword in SEMANTIC_PRIORITY {
                if let Some(spec) = several
                    .iter()
                    .copied()
                    .find(|s| s.name.to_ascii_lowercase().contains(keyword))
                {
                    return Some((spec, true));
                }
                if let Some(spec) = several
                    .iter()
                    .copied()
                    .find(|s| s.description.to_ascii_lowercase().contains(keyword))
                {
                    return Some((spec, true));
                }
            }
            Some((several[0], true))
        }
    }
}

fn unquote(token: &str) -> String {
    let bytes = token.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"' {
        let inner = &token[1..token.len() - 1];
        let mut out = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some('n') => out.push('\n'),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => out.push('\\'),
                }
            } else {
                out.push(c);
            }
        }
        out
    } else if bytes.len() >= 2 && bytes[0] == b'\'' && bytes[bytes.len() - 1] == b'\'' {
        token[1..token.len() - 1].to_string()
    } else {
        token.to_string()
    }
}

/// Type target, widened by description hints ("number", "list of",
/// "JSON object") when the declaration says plain string.
fn effective_type(spec: &ArgumentSpec) -> ArgumentType {
    if spec.arg_type != ArgumentType::String {
        return spec.arg_type;
    }
    let desc = spec.description.to_ascii_lowercase();
    if desc.contains("number") {
        ArgumentType::Number
    } else if desc.contains("list of") {
        ArgumentType::Array
    } else if desc.contains("json object") {
        ArgumentType::Object
    } else if desc.contains("true/false") || desc.contains("boolean") {
        ArgumentType::Boolean
    } else {
        ArgumentType::String
    }
}

/// Best-effort coercion; failures leave the value as-is.
fn coerce(value: Value, spec: &ArgumentSpec) -> Value {
    let Value::String(s) = &value else {
        return value;
    };
    let trimmed = s.trim();
    match effective_type(spec) {
        ArgumentType::String => value,
        ArgumentType::Number => {
            if let Ok(i) = trimmed.parse::<i64>() {
                Value::Number(i.into())
            } else if let Some(n) = trimmed
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
            {
                Value::Number(n)
            } else {
                value
            }
        }
        ArgumentType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => value,
        },
        ArgumentType::Array => {
            if trimmed.starts_with('[') {
                serde_json::from_str(trimmed).unwrap_or(value)
            } else if trimmed.contains(',') {
                Value::Array(
                    trimmed
                        .split(',')
                        .map(|part| Value::String(part.trim().to_string()))
                        .collect(),
                )
            } else {
                value
            }
        }
        ArgumentType::Object => {
            if trimmed.starts_with('{') {
                serde_json::from_str(trimmed).unwrap_or(value)
            } else {
                value
            }
        }
    }
}

/// Fill missing declared arguments: declared default, then runtime prompt
/// defaults, then `PROMPT_<NAME>` environment, then empty-string fallback.
fn apply_defaults(prompt: &PromptDefinition, ctx: &ArgumentContext, out: &mut ParsedArguments) {
    for spec in &prompt.arguments {
        if out.values.contains_key(&spec.name) {
            continue;
        }
        if let Some(default) = &spec.default_value {
            out.values.insert(spec.name.clone(), default.clone());
            out.sources
                .insert(spec.name.clone(), ArgumentSource::DeclaredDefault);
        } else if let Some(default) = ctx.prompt_defaults.get(&spec.name) {
            out.values.insert(spec.name.clone(), default.clone());
            out.sources
                .insert(spec.name.clone(), ArgumentSource::PromptDefaults);
        } else if let Ok(value) = std::env::var(env_var_name(&spec.name)) {
            out.values.insert(spec.name.clone(), Value::String(value));
            out.sources
                .insert(spec.name.clone(), ArgumentSource::Environment);
        } else {
            out.values
                .insert(spec.name.clone(), Value::String(String::new()));
            out.sources
                .insert(spec.name.clone(), ArgumentSource::EmptyFallback);
        }
    }
}

fn env_var_name(arg_name: &str) -> String {
    format!("PROMPT_{}", arg_name.to_ascii_uppercase())
}

fn validate(prompt: &PromptDefinition, parsed: &ParsedArguments) -> Vec<ArgumentIssue> {
    let mut issues = Vec::new();
    for spec in &prompt.arguments {
        let value = parsed.values.get(&spec.name);
        let source = parsed.sources.get(&spec.name);
        let text = value.map(value_text).unwrap_or_default();

        if spec.required {
            let unfilled = matches!(source, Some(ArgumentSource::EmptyFallback) | None)
                || PLACEHOLDER.is_match(text.trim());
            if unfilled {
                issues.push(ArgumentIssue {
                    argument: spec.name.clone(),
                    code: IssueCode::RequiredArgumentMissing,
                    message: format!(
                        "required argument '{}' is missing; provide it as {}",
                        spec.name,
                        example_for(spec)
                    ),
                    example: example_for(spec),
                });
                continue;
            }
        }

        // Constraints only apply to filled values
        if matches!(source, Some(ArgumentSource::EmptyFallback)) {
            continue;
        }
        let Some(validation) = &spec.validation else {
            continue;
        };
        if let Some(min) = validation.min_length {
            if text.chars().count() < min {
                issues.push(ArgumentIssue {
                    argument: spec.name.clone(),
                    code: IssueCode::LengthBound,
                    message: format!("'{}' must be at least {min} characters", spec.name),
                    example: example_for(spec),
                });
                continue;
            }
        }
        if let Some(max) = validation.max_length {
            if text.chars().count() > max {
                issues.push(ArgumentIssue {
                    argument: spec.name.clone(),
                    code: IssueCode::LengthBound,
                    message: format!("'{}' must be at most {max} characters", spec.name),
                    example: example_for(spec),
                });
                continue;
            }
        }
        if let Some(pattern) = &validation.pattern {
            match Regex::new(pattern) {
                Ok(re) => {
                    if !re.is_match(&text) {
                        issues.push(ArgumentIssue {
                            argument: spec.name.clone(),
                            code: IssueCode::PatternMismatch,
                            message: format!("'{}' must match pattern {pattern}", spec.name),
                            example: example_for(spec),
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!(argument = %spec.name, error = %e, "invalid validation pattern");
                }
            }
        }
    }
    issues
}

/// String form of a value as templates would see it.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn example_for(spec: &ArgumentSpec) -> String {
    match effective_type(spec) {
        ArgumentType::String => format!("{}=\"example text\"", spec.name),
        ArgumentType::Number => format!("{}=3", spec.name),
        ArgumentType::Boolean => format!("{}=true", spec.name),
        ArgumentType::Array => format!("{}=\"first, second\"", spec.name),
        ArgumentType::Object => format!("{}={{\"key\": \"value\"}}", spec.name),
    }
}

/// Merge out-of-band request options into an argument map.
///
/// An option overrides an existing argument only when the existing value
/// is an unfilled placeholder: null, empty string, or empty array. Truthy
/// inline values are never overridden.
pub fn merge_request_options(
    args: &mut IndexMap<String, Value>,
    options: &HashMap<String, Value>,
) {
    for (key, value) in options {
        match args.get(key) {
            None => {
                args.insert(key.clone(), value.clone());
            }
            Some(existing) if is_unfilled(existing) => {
                args.insert(key.clone(), value.clone());
            }
            Some(_) => {}
        }
    }
}

fn is_unfilled(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
