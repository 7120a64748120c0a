// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in gate validators.
//!
//! Each validator inspects rendered model output and returns `None` on
//! pass or `Some(message)` describing the failure. The evaluator composes
//! these per criterion; nothing here short-circuits.

use px_core::{OutputFormat, SecurityTier};
use regex::Regex;
use std::sync::LazyLock;

// Allow expect here as the regexes are compile-time verified to be valid
#[allow(clippy::expect_used)]
static HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(#{1,6})\s+\S").expect("constant regex pattern is valid"));

#[allow(clippy::expect_used)]
static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?](\s|$)").expect("constant regex pattern is valid"));

/// Secret patterns by tier. Standard includes basic; strict includes both.
#[allow(clippy::expect_used)]
static SECRET_BASIC: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"(?i)password\s*[:=]\s*\S+"#,
        r#"(?i)api[_-]?key\s*[:=]\s*\S+"#,
        r#"(?i)secret\s*[:=]\s*\S+"#,
    ]
    .iter()
    .map(|p| Regex::new(p).expect("constant regex pattern is valid"))
    .collect()
});

#[allow(clippy::expect_used)]
static SECRET_STANDARD: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"AKIA[0-9A-Z]{16}",
        r"(?i)bearer\s+[a-z0-9._\-]{20,}",
        r"-----BEGIN [A-Z ]*PRIVATE KEY-----",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("constant regex pattern is valid"))
    .collect()
});

#[allow(clippy::expect_used)]
static SECRET_STRICT: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"(?i)token\s*[:=]\s*\S+", r"\b[0-9a-f]{40,}\b"]
        .iter()
        .map(|p| Regex::new(p).expect("constant regex pattern is valid"))
        .collect()
});

/// Format validation: the content must parse as (or plausibly be) the
/// declared format.
pub fn check_format(content: &str, format: OutputFormat) -> Option<String> {
    match format {
        OutputFormat::Json => serde_json::from_str::<serde_json::Value>(content.trim())
            .err()
            .map(|e| format!("content is not valid JSON: {e}")),
        OutputFormat::Yaml => serde_yaml_ok(content),
        OutputFormat::Markdown => {
            let has_structure = HEADER.is_match(content)
                || content.lines().any(|l| {
                    let t = l.trim_start();
                    t.starts_with("- ") || t.starts_with("* ") || t.starts_with("```")
                });
            if content.trim().is_empty() {
                Some("content is empty".to_string())
            } else if !has_structure {
                Some("content has no markdown structure (headers, lists, or code)".to_string())
            } else {
                None
            }
        }
    }
}

// YAML acceptance without taking a serde_yaml dependency here: JSON is a
// YAML subset and prompt outputs are checked structurally. A line-based
// `key: value` scan keeps this crate's dependency set flat.
fn serde_yaml_ok(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Some("content is empty".to_string());
    }
    let looks_structured = trimmed.lines().any(|l| {
        let t = l.trim();
        t.contains(": ") || t.ends_with(':') || t.starts_with("- ")
    }) || serde_json::from_str::<serde_json::Value>(trimmed).is_ok();
    if looks_structured {
        None
    } else {
        Some("content does not look like YAML mappings or sequences".to_string())
    }
}

/// Section presence: each named section must appear as a markdown header.
pub fn check_sections(content: &str, sections: &[String]) -> Option<String> {
    let headers: Vec<String> = content
        .lines()
        .filter(|l| l.trim_start().starts_with('#'))
        .map(|l| l.trim_start_matches('#').trim().to_ascii_lowercase())
        .collect();
    let missing: Vec<&str> = sections
        .iter()
        .filter(|s| {
            let wanted = s.to_ascii_lowercase();
            !headers.iter().any(|h| h.contains(&wanted))
        })
        .map(String::as_str)
        .collect();
    if missing.is_empty() {
        None
    } else {
        Some(format!("missing sections: {}", missing.join(", ")))
    }
}

/// Header hierarchy: single H1 when required, bounded depth, no
/// consecutive header lines.
pub fn check_hierarchy(
    content: &str,
    require_h1: bool,
    max_depth: Option<u8>,
    forbid_consecutive: bool,
) -> Option<String> {
    let mut h1_count = 0usize;
    let mut previous_was_header = false;
    for line in content.lines() {
        if line.trim().is_empty() {
            // Blank lines between headers do not count as body
            continue;
        }
        match HEADER.captures(line) {
            Some(caps) => {
                let depth = caps[1].len();
                if depth == 1 {
                    h1_count += 1;
                }
                if let Some(max) = max_depth {
                    if depth > max as usize {
                        return Some(format!("header depth {depth} exceeds maximum {max}"));
                    }
                }
                if forbid_consecutive && previous_was_header {
                    return Some("consecutive headers with no body between them".to_string());
                }
                previous_was_header = true;
            }
            None => previous_was_header = false,
        }
    }
    if require_h1 && h1_count == 0 {
        return Some("no top-level (H1) header".to_string());
    }
    if h1_count > 1 {
        return Some(format!("{h1_count} top-level headers; expected one"));
    }
    None
}

/// Code quality: brackets inside fenced code blocks must balance and stay
/// under the nesting ceiling.
pub fn check_code_quality(content: &str, max_nesting: Option<u32>) -> Option<String> {
    let mut in_fence = false;
    let mut depth: i64 = 0;
    let mut max_seen: i64 = 0;
    for line in content.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if !in_fence {
            continue;
        }
        for c in line.chars() {
            match c {
                '{' | '(' | '[' => {
                    depth += 1;
                    max_seen = max_seen.max(depth);
                }
                '}' | ')' | ']' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return Some("unbalanced brackets in code block".to_string());
            }
        }
    }
    if depth != 0 {
        return Some("unbalanced brackets in code block".to_string());
    }
    if let Some(max) = max_nesting {
        if max_seen > i64::from(max) {
            return Some(format!(
                "code nesting depth {max_seen} exceeds ceiling {max}"
            ));
        }
    }
    None
}

/// Required fields: each `field:` label must appear somewhere.
pub fn check_required_fields(content: &str, fields: &[String]) -> Option<String> {
    let lower = content.to_ascii_lowercase();
    let missing: Vec<&str> = fields
        .iter()
        .filter(|f| !lower.contains(&format!("{}:", f.to_ascii_lowercase())))
        .map(String::as_str)
        .collect();
    if missing.is_empty() {
        None
    } else {
        Some(format!("missing required fields: {}", missing.join(", ")))
    }
}

/// Composite completeness score in `0..=1`: length, structure, sections,
/// and sentence richness each contribute a quarter.
pub fn completeness_score(content: &str) -> f64 {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    let length = (trimmed.chars().count() as f64 / 400.0).min(1.0);
    let structure = if HEADER.is_match(trimmed)
        || trimmed.lines().any(|l| l.trim_start().starts_with("- "))
    {
        1.0
    } else {
        0.0
    };
    let sections = (trimmed.split("\n\n").filter(|p| !p.trim().is_empty()).count() as f64 / 3.0)
        .min(1.0);
    let sentences = (SENTENCE_END.find_iter(trimmed).count() as f64 / 5.0).min(1.0);
    (length + structure + sections + sentences) / 4.0
}

/// Security scan: no secret-looking pattern may appear.
pub fn check_security(content: &str, tier: SecurityTier) -> Option<String> {
    let mut patterns: Vec<&Regex> = SECRET_BASIC.iter().collect();
    if matches!(tier, SecurityTier::Standard | SecurityTier::Strict) {
        patterns.extend(SECRET_STANDARD.iter());
    }
    if tier == SecurityTier::Strict {
        patterns.extend(SECRET_STRICT.iter());
    }
    for pattern in patterns {
        if pattern.is_match(content) {
            return Some(format!(
                "content matches a secret pattern ({})",
                pattern.as_str()
            ));
        }
    }
    None
}

pub fn check_phrases_present(content: &str, phrases: &[String]) -> Option<String> {
    let lower = content.to_ascii_lowercase();
    let missing: Vec<&str> = phrases
        .iter()
        .filter(|p| !lower.contains(&p.to_ascii_lowercase()))
        .map(String::as_str)
        .collect();
    if missing.is_empty() {
        None
    } else {
        Some(format!("missing required phrases: {}", missing.join(", ")))
    }
}

pub fn check_phrases_absent(content: &str, phrases: &[String]) -> Option<String> {
    let lower = content.to_ascii_lowercase();
    let found: Vec<&str> = phrases
        .iter()
        .filter(|p| lower.contains(&p.to_ascii_lowercase()))
        .map(String::as_str)
        .collect();
    if found.is_empty() {
        None
    } else {
        Some(format!("forbidden phrases present: {}", found.join(", ")))
    }
}

pub fn check_word_count(content: &str, min: Option<usize>, max: Option<usize>) -> Option<String> {
    let words = content.split_whitespace().count();
    if let Some(min) = min {
        if words < min {
            return Some(format!("{words} words; at least {min} required"));
        }
    }
    if let Some(max) = max {
        if words > max {
            return Some(format!("{words} words; at most {max} allowed"));
        }
    }
    None
}

#[cfg(test)]
#[path = "validators_tests.rs"]
mod tests;
