// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Template rendering for prompt user-message templates.
//!
//! Supports `{{var}}` substitution, `{%if%}`/`{%elif%}`/`{%else%}`/`{%endif%}`
//! conditionals over argument truthiness, `{{ref:<promptId>}}` template
//! inclusion, and `{{script:<toolId>}}` script-output inclusion. Rendering
//! is deterministic; reference expansion is cycle-guarded and depth-capped.

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use thiserror::Error;

/// Maximum `ref:` inclusion depth before rendering aborts.
const MAX_REF_DEPTH: usize = 8;

// Allow expect here as the regex is compile-time verified to be valid
#[allow(clippy::expect_used)]
static EXPR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z0-9_.:\-]+)\s*\}\}").expect("constant regex pattern is valid")
});

/// Resolves `{{ref:<promptId>}}` to another prompt's template text.
pub trait RefSource {
    fn template_for(&self, prompt_id: &str) -> Option<String>;
}

/// Resolves `{{script:<toolId>}}` to a script tool's captured output.
pub trait ScriptSource {
    fn output_for(&self, tool_id: &str) -> Option<String>;
}

/// Resolver that knows nothing; refs error, scripts render empty.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRefs;

impl RefSource for NoRefs {
    fn template_for(&self, _prompt_id: &str) -> Option<String> {
        None
    }
}

impl ScriptSource for NoRefs {
    fn output_for(&self, _tool_id: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unknown template reference: {id}")]
    UnknownRef { id: String },
    #[error("template reference cycle involving: {id}")]
    RefCycle { id: String },
    #[error("reference depth exceeded ({MAX_REF_DEPTH})")]
    DepthExceeded,
    #[error("unbalanced conditional: {detail}")]
    Unbalanced { detail: String },
}

/// Render a template with the given argument map and resolvers.
pub fn render(
    template: &str,
    vars: &IndexMap<String, Value>,
    refs: &dyn RefSource,
    scripts: &dyn ScriptSource,
) -> Result<String, TemplateError> {
    let mut stack = Vec::new();
    render_inner(template, vars, refs, scripts, &mut stack)
}

fn render_inner(
    template: &str,
    vars: &IndexMap<String, Value>,
    refs: &dyn RefSource,
    scripts: &dyn ScriptSource,
    ref_stack: &mut Vec<String>,
) -> Result<String, TemplateError> {
    let tokens = tokenize(template);
    let mut idx = 0;
    let (nodes, terminator) = parse_block(&tokens, &mut idx)?;
    if let Some(tag) = terminator {
        return Err(TemplateError::Unbalanced {
            detail: format!("unexpected {{%{tag}%}}"),
        });
    }
    render_nodes(&nodes, vars, refs, scripts, ref_stack)
}

// --- tokenizer -------------------------------------------------------------

enum Token {
    Text(String),
    /// Trimmed contents of a `{% ... %}` tag
    Tag(String),
}

fn tokenize(template: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find("{%") {
        if start > 0 {
            tokens.push(Token::Text(rest[..start].to_string()));
        }
        match rest[start..].find("%}") {
            Some(end_rel) => {
                let inner = &rest[start + 2..start + end_rel];
                tokens.push(Token::Tag(inner.trim().to_string()));
                rest = &rest[start + end_rel + 2..];
            }
            None => {
                // Unterminated tag; emit as literal text
                tokens.push(Token::Text(rest[start..].to_string()));
                rest = "";
            }
        }
    }
    if !rest.is_empty() {
        tokens.push(Token::Text(rest.to_string()));
    }
    tokens
}

// --- parser ----------------------------------------------------------------

enum Node {
    Text(String),
    /// Branches in order; a `None` condition is the `else` arm
    Cond(Vec<(Option<Condition>, Vec<Node>)>),
}

struct Condition {
    var: String,
    negated: bool,
}

fn parse_condition(expr: &str) -> Condition {
    let expr = expr.trim();
    match expr.strip_prefix("not ") {
        Some(rest) => Condition {
            var: rest.trim().to_string(),
            negated: true,
        },
        None => Condition {
            var: expr.to_string(),
            negated: false,
        },
    }
}

/// Parse nodes until a branch terminator tag (`elif`/`else`/`endif`) or
/// end of input. The terminator, when present, is consumed and returned.
fn parse_block(
    tokens: &[Token],
    idx: &mut usize,
) -> Result<(Vec<Node>, Option<String>), TemplateError> {
    let mut nodes = Vec::new();
    while *idx < tokens.len() {
        match &tokens[*idx] {
            Token::Text(text) => {
                nodes.push(Node::Text(text.clone()));
                *idx += 1;
            }
            Token::Tag(tag) => {
                if let Some(expr) = tag.strip_prefix("if ") {
                    *idx += 1;
                    nodes.push(parse_if(expr, tokens, idx)?);
                } else if tag == "endif" || tag == "else" || tag.starts_with("elif") {
                    let tag = tag.clone();
                    *idx += 1;
                    return Ok((nodes, Some(tag)));
                } else {
                    // Unknown tag renders as nothing
                    *idx += 1;
                }
            }
        }
    }
    Ok((nodes, None))
}

fn parse_if(first_expr: &str, tokens: &[Token], idx: &mut usize) -> Result<Node, TemplateError> {
    let mut branches: Vec<(Option<Condition>, Vec<Node>)> = Vec::new();
    let mut condition = Some(parse_condition(first_expr));
    loop {
        let (body, terminator) = parse_block(tokens, idx)?;
        let seen_else = condition.is_none();
        branches.push((condition.take(), body));
        match terminator.as_deref() {
            Some("endif") => return Ok(Node::Cond(branches)),
            Some("else") => {
                if seen_else {
                    return Err(TemplateError::Unbalanced {
                        detail: "duplicate {%else%}".to_string(),
                    });
                }
                condition = None;
            }
            Some(tag) if tag.starts_with("elif") => {
                let expr = tag.trim_start_matches("elif").trim();
                condition = Some(parse_condition(expr));
            }
            _ => {
                return Err(TemplateError::Unbalanced {
                    detail: "missing {%endif%}".to_string(),
                })
            }
        }
    }
}

// --- renderer --------------------------------------------------------------

fn render_nodes(
    nodes: &[Node],
    vars: &IndexMap<String, Value>,
    refs: &dyn RefSource,
    scripts: &dyn ScriptSource,
    ref_stack: &mut Vec<String>,
) -> Result<String, TemplateError> {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(&substitute(text, vars, refs, scripts, ref_stack)?),
            Node::Cond(branches) => {
                for (condition, body) in branches {
                    let taken = match condition {
                        Some(c) => truthy(vars.get(&c.var)) != c.negated,
                        None => true,
                    };
                    if taken {
                        out.push_str(&render_nodes(body, vars, refs, scripts, ref_stack)?);
                        break;
                    }
                }
            }
        }
    }
    Ok(out)
}

fn substitute(
    text: &str,
    vars: &IndexMap<String, Value>,
    refs: &dyn RefSource,
    scripts: &dyn ScriptSource,
    ref_stack: &mut Vec<String>,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for caps in EXPR_PATTERN.captures_iter(text) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => continue,
        };
        out.push_str(&text[last..whole.start()]);
        last = whole.end();
        let expr = &caps[1];
        if let Some(prompt_id) = expr.strip_prefix("ref:") {
            out.push_str(&expand_ref(prompt_id, vars, refs, scripts, ref_stack)?);
        } else if let Some(tool_id) = expr.strip_prefix("script:") {
            out.push_str(&scripts.output_for(tool_id).unwrap_or_default());
        } else {
            out.push_str(&vars.get(expr).map(value_to_text).unwrap_or_default());
        }
    }
    out.push_str(&text[last..]);
    Ok(out)
}

fn expand_ref(
    prompt_id: &str,
    vars: &IndexMap<String, Value>,
    refs: &dyn RefSource,
    scripts: &dyn ScriptSource,
    ref_stack: &mut Vec<String>,
) -> Result<String, TemplateError> {
    let key = px_core::fold_id(prompt_id);
    if ref_stack.iter().any(|seen| *seen == key) {
        return Err(TemplateError::RefCycle {
            id: prompt_id.to_string(),
        });
    }
    if ref_stack.len() >= MAX_REF_DEPTH {
        return Err(TemplateError::DepthExceeded);
    }
    let template = refs
        .template_for(prompt_id)
        .ok_or_else(|| TemplateError::UnknownRef {
            id: prompt_id.to_string(),
        })?;
    ref_stack.push(key);
    let rendered = render_inner(&template, vars, refs, scripts, ref_stack);
    ref_stack.pop();
    rendered
}

/// String form of a template variable.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Truthiness for conditionals: absent, null, false, zero, and empty
/// strings/collections are false; everything else is true.
fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;
