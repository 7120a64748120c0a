// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Symbolic command parsing.
//!
//! Grammar (informal):
//!
//! ```text
//! command      := { modifier-op }, prompt-ref, { chain-op, prompt-ref }, [ arg-payload ]
//! modifier-op  := "@" framework-id
//!               | "::" quoted-string
//!               | "::" gate-id ": " quoted-string
//!               | "::" gate-id ": $(" shell-text ")"
//!               | "#" style-id
//!               | "%lean" | "%clean"
//! prompt-ref   := ">>" prompt-id
//! chain-op     := "-->" | "|"
//! arg-payload  := json-object | key-value-list | free-text
//! ```
//!
//! The classic format (a bare `prompt-id args` with no `>>`) is accepted
//! when no modifier operators are present.

use px_core::{
    CommandFormat, CommandOperator, CommandType, NamedInlineGate, ParsedCommand, ParsedStep,
    PromptDefinition,
};
use std::sync::Arc;
use thiserror::Error;

use crate::suggest::{find_similar, format_suggestion};

/// Read-only prompt resolution the parser needs from the registry.
///
/// Implemented by the registry snapshot; lookup is case-insensitive by
/// ID and by name.
pub trait PromptLookup {
    fn resolve(&self, id_or_name: &str) -> Option<Arc<PromptDefinition>>;
    /// All registered prompt IDs, for suggestion lists.
    fn prompt_ids(&self) -> Vec<String>;
}

/// Terminal parse failures. Parsing is never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandParseError {
    #[error("missing command")]
    MissingCommand,
    #[error("malformed operator near '{fragment}': {reason}")]
    MalformedOperator { fragment: String, reason: String },
    #[error("prompt not found: {id}{}", format_suggestion(.suggestions))]
    PromptNotFound {
        id: String,
        suggestions: Vec<String>,
    },
}

/// Parse a symbolic command against a registry snapshot.
///
/// Pure: equal inputs produce equal outputs. `prompt_args` on the result
/// is left empty; the argument parser fills it.
pub fn parse_command(
    input: &str,
    lookup: &dyn PromptLookup,
) -> Result<ParsedCommand, CommandParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CommandParseError::MissingCommand);
    }

    let mut cur = Cursor::new(input);
    let mut operators = Vec::new();
    let mut classic = false;

    loop {
        cur.skip_ws();
        if cur.at_end() {
            // Modifiers with no prompt reference
            return Err(CommandParseError::MissingCommand);
        }
        if cur.starts_with(">>") {
            break;
        }
        if cur.starts_with('@') {
            cur.bump(1);
            let id = cur.take_word();
            if id.is_empty() {
                return Err(malformed(&cur, "expected framework id after '@'"));
            }
            operators.push(CommandOperator::FrameworkOverride { framework_id: id });
        } else if cur.starts_with('#') {
            cur.bump(1);
            let id = cur.take_word();
            if id.is_empty() {
                return Err(malformed(&cur, "expected style id after '#'"));
            }
            operators.push(CommandOperator::StyleSelection { style_id: id });
        } else if cur.starts_with('%') {
            cur.bump(1);
            let flag = cur.take_word();
            match flag.as_str() {
                "lean" => operators.push(CommandOperator::Lean),
                "clean" => operators.push(CommandOperator::Clean),
                other => {
                    return Err(CommandParseError::MalformedOperator {
                        fragment: format!("%{other}"),
                        reason: "expected %lean or %clean".to_string(),
                    })
                }
            }
        } else if cur.starts_with("::") {
            cur.bump(2);
            operators.push(parse_gate_operator(&mut cur)?);
        } else if operators.is_empty() {
            // Classic format: bare prompt id, rest is payload
            classic = true;
            break;
        } else {
            return Err(malformed(&cur, "expected '>>' prompt reference"));
        }
    }

    // Collect prompt references with their argument payloads
    let mut refs: Vec<(String, String)> = Vec::new();
    if classic {
        let id = cur.take_word();
        if id.is_empty() {
            return Err(CommandParseError::MissingCommand);
        }
        cur.skip_ws();
        refs.push((id, cur.rest().trim().to_string()));
    } else {
        loop {
            cur.skip_ws();
            if !cur.starts_with(">>") {
                return Err(malformed(&cur, "expected '>>' prompt reference"));
            }
            cur.bump(2);
            cur.skip_ws();
            let id = cur.take_word();
            if id.is_empty() {
                return Err(malformed(&cur, "expected prompt id after '>>'"));
            }
            let (args_text, more) = cur.take_until_chain_op();
            refs.push((id, args_text.trim().to_string()));
            if !more {
                break;
            }
        }
    }

    // Resolve every reference against the registry
    let mut resolved: Vec<Arc<PromptDefinition>> = Vec::with_capacity(refs.len());
    for (id, _) in &refs {
        resolved.push(resolve_or_suggest(lookup, id)?);
    }
    let first = Arc::clone(&resolved[0]);

    // Steps: explicit multi-prompt sequence, or the first prompt's own
    // chain definition when chain operators were absent.
    let mut steps: Vec<ParsedStep> = Vec::new();
    if refs.len() > 1 {
        for (i, ((_, raw_args), def)) in refs.iter().zip(&resolved).enumerate() {
            steps.push(ParsedStep {
                step_number: (i + 1) as u32,
                prompt_id: def.id.clone(),
                raw_args: raw_args.clone(),
                args: indexmap::IndexMap::new(),
            });
        }
    } else if first.is_chain() {
        for step in &first.chain_steps {
            // Every step's prompt must exist up front
            let def = resolve_or_suggest(lookup, &step.prompt_id)?;
            steps.push(ParsedStep {
                step_number: step.step_number,
                prompt_id: def.id.clone(),
                raw_args: String::new(),
                args: step.args.clone(),
            });
        }
    }

    let command_type = if steps.is_empty() {
        CommandType::Single
    } else {
        CommandType::Chain
    };

    let style_selection = operators.iter().rev().find_map(|op| match op {
        CommandOperator::StyleSelection { style_id } => Some(style_id.clone()),
        _ => None,
    });
    let inline_gate_criteria: Vec<String> = operators
        .iter()
        .filter_map(|op| match op {
            CommandOperator::AnonymousGate { criteria } => Some(criteria.clone()),
            _ => None,
        })
        .flatten()
        .collect();
    let named_inline_gates: Vec<NamedInlineGate> = operators
        .iter()
        .filter_map(|op| match op {
            CommandOperator::NamedGate { gate_id, criteria } => Some(NamedInlineGate {
                gate_id: gate_id.clone(),
                criteria: criteria.clone(),
                shell_command: None,
            }),
            CommandOperator::ShellVerifyGate { gate_id, command } => Some(NamedInlineGate {
                gate_id: gate_id.clone(),
                criteria: Vec::new(),
                shell_command: Some(command.clone()),
            }),
            _ => None,
        })
        .collect();

    Ok(ParsedCommand {
        prompt_id: first.id.clone(),
        format: if classic {
            CommandFormat::Classic
        } else {
            CommandFormat::Symbolic
        },
        command_type,
        raw_args: refs[0].1.clone(),
        operators,
        steps,
        prompt_args: indexmap::IndexMap::new(),
        style_selection,
        inline_gate_criteria,
        named_inline_gates,
    })
}

fn resolve_or_suggest(
    lookup: &dyn PromptLookup,
    id: &str,
) -> Result<Arc<PromptDefinition>, CommandParseError> {
    lookup
        .resolve(id)
        .ok_or_else(|| CommandParseError::PromptNotFound {
            id: id.to_string(),
            suggestions: find_similar(&px_core::fold_id(id), &lookup.prompt_ids()),
        })
}

/// Parse the tail of a `::` operator. The leading `::` is consumed.
fn parse_gate_operator(cur: &mut Cursor<'_>) -> Result<CommandOperator, CommandParseError> {
    cur.skip_ws();
    if cur.starts_with('"') {
        let text = cur.take_quoted()?;
        return Ok(CommandOperator::AnonymousGate {
            criteria: split_criteria(&text),
        });
    }
    let gate_id = cur.take_word();
    if gate_id.is_empty() {
        return Err(malformed(cur, "expected gate id or quoted criteria after '::'"));
    }
    if !cur.starts_with(':') {
        return Err(malformed(cur, "expected ':' after gate id"));
    }
    cur.bump(1);
    cur.skip_ws();
    if cur.starts_with("$(") {
        cur.bump(2);
        let command = cur.take_until_matching_paren()?;
        return Ok(CommandOperator::ShellVerifyGate { gate_id, command });
    }
    if cur.starts_with('"') {
        let text = cur.take_quoted()?;
        return Ok(CommandOperator::NamedGate {
            gate_id,
            criteria: split_criteria(&text),
        });
    }
    Err(malformed(cur, "expected quoted criteria or $(command)"))
}

/// A quoted criteria string may carry several checks separated by ';'.
fn split_criteria(text: &str) -> Vec<String> {
    text.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn malformed(cur: &Cursor<'_>, reason: &str) -> CommandParseError {
    let fragment: String = cur.rest().chars().take(24).collect();
    CommandParseError::MalformedOperator {
        fragment,
        reason: reason.to_string(),
    }
}

/// Byte-offset scanner over the command text.
struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn starts_with(&self, pat: impl Pattern) -> bool {
        pat.matches(self.rest())
    }

    fn bump(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.input.len());
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.rest().chars().next() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    /// Take an identifier word: alphanumerics plus `_ - .`
    fn take_word(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.rest().chars().next() {
            if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    /// Take a `"..."` string honoring `\"` and `\\` escapes. The cursor
    /// must be positioned on the opening quote.
    fn take_quoted(&mut self) -> Result<String, CommandParseError> {
        self.bump(1); // opening quote
        let mut out = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    if let Some((_, escaped)) = chars.next() {
                        match escaped {
                            '"' => out.push('"'),
                            '\\' => out.push('\\'),
                            other => {
                                out.push('\\');
                                out.push(other);
                            }
                        }
                    }
                }
                '"' => {
                    self.bump(i + c.len_utf8());
                    return Ok(out);
                }
                other => out.push(other),
            }
        }
        Err(CommandParseError::MalformedOperator {
            fragment: out.chars().take(24).collect(),
            reason: "unterminated quoted string".to_string(),
        })
    }

    /// Take shell text up to the `)` matching an already-consumed `$(`.
    fn take_until_matching_paren(&mut self) -> Result<String, CommandParseError> {
        let mut depth = 1usize;
        let start = self.pos;
        for (i, c) in self.rest().char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        let text = self.input[start..start + i].to_string();
                        self.bump(i + 1);
                        return Ok(text.trim().to_string());
                    }
                }
                _ => {}
            }
        }
        Err(CommandParseError::MalformedOperator {
            fragment: self.rest().chars().take(24).collect(),
            reason: "unterminated $(...) command".to_string(),
        })
    }

    /// Take argument text up to the next chain operator (`-->` or `|`)
    /// outside double quotes. Returns the text and whether an operator
    /// was consumed (more prompt references follow).
    fn take_until_chain_op(&mut self) -> (String, bool) {
        let rest = self.rest();
        let mut in_quotes = false;
        let mut escaped = false;
        let bytes = rest.as_bytes();
        let mut i = 0usize;
        while i < bytes.len() {
            let c = bytes[i] as char;
            if escaped {
                escaped = false;
                i += 1;
                continue;
            }
            match c {
                '\\' if in_quotes => escaped = true,
                '"' => in_quotes = !in_quotes,
                '-' if !in_quotes && rest[i..].starts_with("-->") => {
                    let text = rest[..i].to_string();
                    self.bump(i + 3);
                    return (text, true);
                }
                '|' if !in_quotes => {
                    let text = rest[..i].to_string();
                    self.bump(i + 1);
                    return (text, true);
                }
                _ => {}
            }
            i += 1;
        }
        let text = rest.to_string();
        self.bump(rest.len());
        (text, false)
    }
}

/// Tiny str/char pattern helper so `starts_with` reads naturally.
trait Pattern {
    fn matches(self, haystack: &str) -> bool;
}

impl Pattern for &str {
    fn matches(self, haystack: &str) -> bool {
        haystack.starts_with(self)
    }
}

impl Pattern for char {
    fn matches(self, haystack: &str) -> bool {
        haystack.starts_with(self)
    }
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
