//! Command parsing specs, including the concrete scenarios.

use crate::prelude::*;
use px_command::{parse_command, CommandParseError};
use px_core::CommandOperator;

#[tokio::test]
async fn greet_renders_hello_ada() {
    let fx = fixture();
    let response = run_command(&fx, ">>greet name=\"Ada\"").await;
    assert!(!response.is_error);
    assert!(response.first_text().ends_with("Hello, Ada!"));
}

#[tokio::test]
async fn missing_required_argument_names_the_constraint() {
    let fx = fixture();
    let response = run_command(&fx, ">>greet").await;
    assert!(response.is_error);
    assert!(response.first_text().contains("REQUIRED_ARGUMENT_MISSING"));
    assert!(response.first_text().contains("name"));
}

#[tokio::test]
async fn framework_and_anonymous_gate_operators() {
    let fx = fixture();
    let registries = fx.engine.registries();
    let parsed = parse_command("@ReACT :: \"concise\" >>analyze topic=\"graphs\"", registries)
        .unwrap();
    assert_eq!(parsed.framework_override(), Some("ReACT"));
    assert_eq!(parsed.inline_gate_criteria, vec!["concise".to_string()]);

    let plan = px_engine::build_plan(
        &parsed,
        registries,
        &px_engine::ExecutionRequest::from_command("unused"),
    )
    .unwrap();
    assert!(plan.gates.contains(&"inline".to_string()));
    assert_eq!(plan.modifiers.framework_override.as_deref(), Some("ReACT"));
}

#[tokio::test]
async fn unknown_prompt_suggests_index() {
    let fx = fixture();
    let response = run_command(&fx, ">>idx").await;
    assert!(response.is_error);
    assert_eq!(response.metadata["error_kind"], "resource_not_found");
    assert!(response.metadata["suggestions"]
        .as_array()
        .unwrap()
        .iter()
        .any(|s| s == "index"));
}

#[test]
fn parsing_is_a_pure_function() {
    let fx = fixture();
    let registries = fx.engine.registries();
    for input in [
        ">>greet name=\"Ada\"",
        "@CAGEERF :: \"quality\" %lean >>clarify --> >>plan key=x",
        "::build: $(cargo check) #analytical >>analyze",
    ] {
        let a = parse_command(input, registries).unwrap();
        let b = parse_command(input, registries).unwrap();
        assert_eq!(a, b, "parse differs for {input}");
    }
}

#[test]
fn malformed_operator_is_terminal() {
    let fx = fixture();
    let err = parse_command("%turbo >>greet", fx.engine.registries()).unwrap_err();
    assert!(matches!(err, CommandParseError::MalformedOperator { .. }));
}

#[test]
fn shell_verify_operator_round_trips_the_command_text() {
    let fx = fixture();
    let parsed = parse_command("::check: $(test -f README.md) >>greet", fx.engine.registries())
        .unwrap();
    assert!(parsed.operators.iter().any(|op| matches!(
        op,
        CommandOperator::ShellVerifyGate { gate_id, command }
            if gate_id == "check" && command == "test -f README.md"
    )));
}
