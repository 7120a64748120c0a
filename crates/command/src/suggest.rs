// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! "Did you mean?" suggestion helpers for resource-lookup error messages.

/// Levenshtein edit distance between two strings.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut dp = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, val) in dp[0].iter_mut().enumerate() {
        *val = j;
    }
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            dp[i][j] = (dp[i - 1][j] + 1)
                .min(dp[i][j - 1] + 1)
                .min(dp[i - 1][j - 1] + cost);
        }
    }
    dp[a.len()][b.len()]
}

/// Find similar names from a list of candidates.
/// Returns names within edit distance <= max(2, input.len()/3),
/// sorted by distance (closest first). Also includes prefix matches.
pub fn find_similar(input: &str, candidates: &[String]) -> Vec<String> {
    let threshold = (input.len() / 3).max(2);
    let mut matches: Vec<(usize, String)> = candidates
        .iter()
        .filter(|c| c.as_str() != input)
        .filter_map(|c| {
            let dist = edit_distance(input, c);
            if dist <= threshold || c.starts_with(input) || input.starts_with(c.as_str()) {
                Some((dist, c.clone()))
            } else {
                None
            }
        })
        .collect();
    matches.sort_by_key(|(d, _)| *d);
    matches.into_iter().map(|(_, name)| name).collect()
}

/// Format a "did you mean" hint for appending to an error message.
/// Returns empty string if no suggestions.
pub fn format_suggestion(similar: &[String]) -> String {
    match similar.len() {
        0 => String::new(),
        1 => format!(" (did you mean: {}?)", similar[0]),
        _ => format!(" (did you mean one of: {}?)", similar.join(", ")),
    }
}

#[cfg(test)]
#[path = "suggest_tests.rs"]
mod tests;
