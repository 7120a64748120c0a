//! Hot-reload atomicity and the change journal.

use crate::prelude::*;
use px_registry::{
    load_prompt, ChangeKind, ChangeOrigin, ReloadCoordinator, ResourceChangeTracker,
};
use std::sync::Arc;

#[tokio::test]
async fn in_flight_reads_survive_a_swap() {
    let fx = fixture();
    let registries = fx.engine.registries();

    // A reader takes its snapshot before the swap
    let before = registries.prompts.get("greet").unwrap();
    assert_eq!(before.user_message_template, "Hello, {{name}}!");

    write_resource(
        fx.tmp.path(),
        "prompts",
        "greet",
        "prompt.yaml",
        r#"
user_message_template: "Hi there, {{name}}."
arguments:
  - name: name
    required: true
"#,
    );
    let tracker = Arc::new(
        ResourceChangeTracker::open(&fx.tmp.path().join("journal.jsonl")).unwrap(),
    );
    let coordinator = ReloadCoordinator::new(
        fx.tmp.path().join("prompts"),
        Arc::clone(&registries.prompts),
        tracker,
        load_prompt,
    );
    coordinator.apply_change(&fx.tmp.path().join("prompts/greet/prompt.yaml"));

    // The pre-swap reference still reads the old definition; new lookups
    // see the replacement. No half-mutated state either way.
    assert_eq!(before.user_message_template, "Hello, {{name}}!");
    assert_eq!(
        registries.prompts.get("greet").unwrap().user_message_template,
        "Hi there, {{name}}."
    );

    // And requests pick up the new template
    let response = run_command(&fx, ">>greet name=\"Ada\"").await;
    assert!(response.first_text().contains("Hi there, Ada."));
}

#[tokio::test]
async fn broken_edit_retains_the_previous_definition() {
    let fx = fixture();
    let registries = fx.engine.registries();
    let file = fx.tmp.path().join("prompts/greet/prompt.yaml");
    std::fs::write(&file, ": broken :: yaml").unwrap();

    let tracker = Arc::new(
        ResourceChangeTracker::open(&fx.tmp.path().join("journal.jsonl")).unwrap(),
    );
    let coordinator = ReloadCoordinator::new(
        fx.tmp.path().join("prompts"),
        Arc::clone(&registries.prompts),
        tracker,
        load_prompt,
    );
    coordinator.apply_change(&file);

    let response = run_command(&fx, ">>greet name=\"Ada\"").await;
    assert!(response.first_text().ends_with("Hello, Ada!"));
}

#[test]
fn journal_distinguishes_filesystem_and_tool_edits() {
    let tmp = tempfile::tempdir().unwrap();
    let tracker = ResourceChangeTracker::open(&tmp.path().join("journal.jsonl")).unwrap();
    let path = tmp.path().join("prompt.yaml");

    let fs_change = tracker
        .record(&path, Some(b"v1"), ChangeOrigin::Filesystem)
        .unwrap();
    assert_eq!(fs_change.origin, ChangeOrigin::Filesystem);
    assert_eq!(fs_change.kind, ChangeKind::Added);

    let tool_change = tracker
        .record(&path, Some(b"v2"), ChangeOrigin::Tool)
        .unwrap();
    assert_eq!(tool_change.origin, ChangeOrigin::Tool);
    assert_eq!(tool_change.kind, ChangeKind::Modified);
}

#[test]
fn startup_diff_surfaces_downtime_edits() {
    let tmp = tempfile::tempdir().unwrap();
    let root = tmp.path().join("prompts");
    std::fs::create_dir_all(root.join("greet")).unwrap();
    let file = root.join("greet/prompt.yaml");
    std::fs::write(&file, "user_message_template: v1\n").unwrap();

    let journal = tmp.path().join("journal.jsonl");
    {
        let tracker = ResourceChangeTracker::open(&journal).unwrap();
        tracker
            .record(
                &file,
                Some(b"user_message_template: v1\n"),
                ChangeOrigin::Filesystem,
            )
            .unwrap();
    }

    // Edited while the process was down
    std::fs::write(&file, "user_message_template: v2\n").unwrap();

    let tracker = ResourceChangeTracker::open(&journal).unwrap();
    let diff = tracker.startup_diff(&[root]);
    assert_eq!(diff.len(), 1);
    assert_eq!(diff[0].kind, ChangeKind::Modified);
    assert_eq!(diff[0].path, file);
}
