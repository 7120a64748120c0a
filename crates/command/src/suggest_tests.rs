// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn distance_of_identical_strings_is_zero() {
    assert_eq!(edit_distance("greet", "greet"), 0);
}

#[test]
fn distance_counts_single_edits() {
    assert_eq!(edit_distance("idx", "index"), 2);
    assert_eq!(edit_distance("greet", "great"), 1);
}

#[test]
fn close_names_are_suggested_closest_first() {
    let candidates = names(&["index", "ingest", "greet"]);
    let similar = find_similar("idx", &candidates);
    assert_eq!(similar.first().map(String::as_str), Some("index"));
    assert!(!similar.contains(&"greet".to_string()));
}

#[test]
fn prefix_matches_are_included() {
    let candidates = names(&["summarize_article"]);
    let similar = find_similar("summarize", &candidates);
    assert_eq!(similar, vec!["summarize_article".to_string()]);
}

#[test]
fn exact_match_is_never_suggested() {
    let candidates = names(&["greet"]);
    assert!(find_similar("greet", &candidates).is_empty());
}

#[test]
fn formatting_handles_zero_one_many() {
    assert_eq!(format_suggestion(&[]), "");
    assert_eq!(
        format_suggestion(&names(&["index"])),
        " (did you mean: index?)"
    );
    assert_eq!(
        format_suggestion(&names(&["index", "ingest"])),
        " (did you mean one of: index, ingest?)"
    );
}
