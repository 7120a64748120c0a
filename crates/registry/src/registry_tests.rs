// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn prompt(id: &str, name: &str) -> PromptDefinition {
    PromptDefinition {
        id: id.to_string(),
        name: name.to_string(),
        category: "general".to_string(),
        system_message: None,
        user_message_template: String::new(),
        arguments: vec![],
        chain_steps: vec![],
        gate_configuration: None,
        script_tools: vec![],
        injection: None,
        prompt_dir: None,
    }
}

#[test]
fn lookup_is_case_insensitive_by_id_and_name() {
    let registry = Registry::new();
    registry.insert(prompt("readme_improver", "README Improver"));
    assert!(registry.get("README_IMPROVER").is_some());
    assert!(registry.get("readme improver").is_some());
    assert!(registry.get("unknown").is_none());
}

#[test]
fn insert_replaces_existing_entry() {
    let registry = Registry::new();
    registry.insert(prompt("greet", "Greet"));
    let mut updated = prompt("greet", "Greeter");
    updated.category = "social".to_string();
    registry.insert(updated);

    assert_eq!(registry.len(), 1);
    let got = registry.get("greet").unwrap();
    assert_eq!(got.category, "social");
    // The old name no longer resolves; the new one does
    assert!(registry.get("Greet").is_none());
    assert!(registry.get("greeter").is_some());
}

#[test]
fn readers_keep_their_snapshot_across_a_swap() {
    let registry = Registry::new();
    registry.insert(prompt("greet", "Greet"));
    let before = registry.get("greet").unwrap();

    let mut updated = prompt("greet", "Greet");
    updated.user_message_template = "changed".to_string();
    registry.insert(updated);

    // The Arc held before the swap still reads the old definition
    assert_eq!(before.user_message_template, "");
    assert_eq!(registry.get("greet").unwrap().user_message_template, "changed");
}

#[test]
fn remove_drops_both_indexes() {
    let registry = Registry::new();
    registry.insert(prompt("greet", "Greeter"));
    assert!(registry.remove("GREET").is_some());
    assert!(registry.get("greet").is_none());
    assert!(registry.get("greeter").is_none());
    assert!(registry.remove("greet").is_none());
}

#[test]
fn replace_all_swaps_contents() {
    let registry = Registry::new();
    registry.insert(prompt("old", "Old"));
    registry.replace_all(vec![prompt("a", "A"), prompt("b", "B")]);
    assert!(registry.get("old").is_none());
    assert_eq!(registry.ids(), vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn registry_set_resolves_prompts_for_the_parser() {
    let set = RegistrySet::new();
    set.prompts.insert(prompt("greet", "Greet"));
    assert!(set.resolve("greet").is_some());
    assert_eq!(set.prompt_ids(), vec!["greet".to_string()]);
}
