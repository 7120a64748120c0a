// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use px_core::ArgumentValidation;
use serial_test::serial;
use yare::parameterized;

fn arg(name: &str, required: bool) -> ArgumentSpec {
    ArgumentSpec {
        name: name.to_string(),
        arg_type: ArgumentType::String,
        required,
        description: String::new(),
        default_value: None,
        validation: None,
    }
}

fn prompt_with(args: Vec<ArgumentSpec>) -> PromptDefinition {
    PromptDefinition {
        id: "greet".to_string(),
        name: "greet".to_string(),
        category: "general".to_string(),
        system_message: None,
        user_message_template: String::new(),
        arguments: args,
        chain_steps: vec![],
        gate_configuration: None,
        script_tools: vec![],
        injection: None,
        prompt_dir: None,
    }
}

fn ctx() -> ArgumentContext {
    ArgumentContext::default()
}

// =============================================================================
// Strategy selection
// =============================================================================

#[parameterized(
    json_object = { r#"{"name": "Ada"}"#, ParseStrategy::Json },
    json_array = { r#"["a", "b"]"#, ParseStrategy::Json },
    key_value = { r#"name="Ada""#, ParseStrategy::KeyValue },
    colon_value = { "name: Ada", ParseStrategy::KeyValue },
    bare_text = { "just some text", ParseStrategy::SimpleText },
)]
fn strategy_selection(raw: &str, expected: ParseStrategy) {
    let prompt = prompt_with(vec![arg("name", false)]);
    assert_eq!(select_strategy(raw, &prompt), expected);
}

#[test]
fn empty_payload_uses_fallback() {
    let prompt = prompt_with(vec![arg("name", false)]);
    assert_eq!(select_strategy("", &prompt), ParseStrategy::Fallback);
}

#[test]
fn bare_text_without_declared_args_uses_fallback() {
    let prompt = prompt_with(vec![]);
    assert_eq!(select_strategy("text", &prompt), ParseStrategy::Fallback);
}

// =============================================================================
// Parsing strategies
// =============================================================================

#[test]
fn json_object_payload() {
    let prompt = prompt_with(vec![arg("name", true)]);
    let parsed = parse_arguments(r#"{"name": "Ada"}"#, &prompt, &ctx()).unwrap();
    assert_eq!(parsed.values["name"], serde_json::json!("Ada"));
    assert_eq!(parsed.sources["name"], ArgumentSource::UserProvided);
}

#[test]
fn json_array_assigns_positionally() {
    let prompt = prompt_with(vec![arg("first", true), arg("second", true)]);
    let parsed = parse_arguments(r#"["a", "b"]"#, &prompt, &ctx()).unwrap();
    assert_eq!(parsed.values["first"], serde_json::json!("a"));
    assert_eq!(parsed.values["second"], serde_json::json!("b"));
}

#[test]
fn key_value_payload_with_quotes_and_escapes() {
    let prompt = prompt_with(vec![arg("name", true), arg("note", false)]);
    let parsed =
        parse_arguments(r#"name="Ada \"the first\"" note=plain"#, &prompt, &ctx()).unwrap();
    assert_eq!(parsed.values["name"], serde_json::json!(r#"Ada "the first""#));
    assert_eq!(parsed.values["note"], serde_json::json!("plain"));
}

#[test]
fn simple_text_maps_to_single_argument() {
    let prompt = prompt_with(vec![arg("name", true)]);
    let parsed = parse_arguments("Ada", &prompt, &ctx()).unwrap();
    assert_eq!(parsed.values["name"], serde_json::json!("Ada"));
    assert_eq!(parsed.sources["name"], ArgumentSource::UserProvided);
}

#[test]
fn simple_text_smart_maps_by_semantic_priority() {
    let prompt = prompt_with(vec![arg("depth", false), arg("content", false)]);
    let parsed = parse_arguments("summarize this", &prompt, &ctx()).unwrap();
    assert_eq!(parsed.values["content"], serde_json::json!("summarize this"));
    assert_eq!(
        parsed.sources["content"],
        ArgumentSource::UserProvidedSmartMapped
    );
}

#[test]
fn smart_mapping_consults_descriptions() {
    let mut spec = arg("body", false);
    spec.description = "the text to rework".to_string();
    let prompt = prompt_with(vec![arg("depth", false), spec]);
    let parsed = parse_arguments("rework me", &prompt, &ctx()).unwrap();
    assert_eq!(parsed.values["body"], serde_json::json!("rework me"));
}

// =============================================================================
// Coercion
// =============================================================================

#[test]
fn coerces_declared_number() {
    let mut spec = arg("count", false);
    spec.arg_type = ArgumentType::Number;
    let prompt = prompt_with(vec![spec]);
    let parsed = parse_arguments("count=3", &prompt, &ctx()).unwrap();
    assert_eq!(parsed.values["count"], serde_json::json!(3));
}

#[parameterized(
    truthy = { "flag=TRUE", true },
    falsy = { "flag=false", false },
)]
fn coerces_declared_boolean(raw: &str, expected: bool) {
    let mut spec = arg("flag", false);
    spec.arg_type = ArgumentType::Boolean;
    let prompt = prompt_with(vec![spec]);
    let parsed = parse_arguments(raw, &prompt, &ctx()).unwrap();
    assert_eq!(parsed.values["flag"], serde_json::json!(expected));
}

#[test]
fn coerces_comma_list_to_array() {
    let mut spec = arg("items", false);
    spec.arg_type = ArgumentType::Array;
    let prompt = prompt_with(vec![spec]);
    let parsed = parse_arguments("items=\"a, b, c\"", &prompt, &ctx()).unwrap();
    assert_eq!(parsed.values["items"], serde_json::json!(["a", "b", "c"]));
}

#[test]
fn coerces_json_object_string() {
    let mut spec = arg("config", false);
    spec.arg_type = ArgumentType::Object;
    let prompt = prompt_with(vec![spec]);
    let parsed = parse_arguments(r#"config='{"k": 1}'"#, &prompt, &ctx()).unwrap();
    assert_eq!(parsed.values["config"], serde_json::json!({"k": 1}));
}

#[test]
fn coercion_failure_leaves_value_as_is() {
    let mut spec = arg("count", false);
    spec.arg_type = ArgumentType::Number;
    let prompt = prompt_with(vec![spec]);
    let parsed = parse_arguments("count=three", &prompt, &ctx()).unwrap();
    assert_eq!(parsed.values["count"], serde_json::json!("three"));
}

#[test]
fn description_hint_infers_number() {
    let mut spec = arg("depth", false);
    spec.description = "number of levels to descend".to_string();
    let prompt = prompt_with(vec![spec]);
    let parsed = parse_arguments("depth=2", &prompt, &ctx()).unwrap();
    assert_eq!(parsed.values["depth"], serde_json::json!(2));
}

#[test]
fn coercion_round_trips_through_text_form() {
    for value in [
        serde_json::json!(42),
        serde_json::json!(true),
        serde_json::json!(["a", "b"]),
        serde_json::json!({"k": "v"}),
    ] {
        let mut spec = arg("v", false);
        spec.arg_type = match &value {
            serde_json::Value::Number(_) => ArgumentType::Number,
            serde_json::Value::Bool(_) => ArgumentType::Boolean,
            serde_json::Value::Array(_) => ArgumentType::Array,
            _ => ArgumentType::Object,
        };
        let text = value_text(&value);
        let coerced = super::coerce(serde_json::Value::String(text), &spec);
        assert_eq!(coerced, value);
    }
}

// =============================================================================
// Defaults
// =============================================================================

#[test]
fn declared_default_fills_missing() {
    let mut spec = arg("tone", false);
    spec.default_value = Some(serde_json::json!("friendly"));
    let prompt = prompt_with(vec![spec]);
    let parsed = parse_arguments("", &prompt, &ctx()).unwrap();
    assert_eq!(parsed.values["tone"], serde_json::json!("friendly"));
    assert_eq!(parsed.sources["tone"], ArgumentSource::DeclaredDefault);
}

#[test]
fn runtime_prompt_defaults_fill_after_declared() {
    let prompt = prompt_with(vec![arg("tone", false)]);
    let mut context = ctx();
    context
        .prompt_defaults
        .insert("tone".to_string(), serde_json::json!("neutral"));
    let parsed = parse_arguments("", &prompt, &context).unwrap();
    assert_eq!(parsed.values["tone"], serde_json::json!("neutral"));
    assert_eq!(parsed.sources["tone"], ArgumentSource::PromptDefaults);
}

#[test]
#[serial]
fn environment_variable_fills_missing() {
    std::env::set_var("PROMPT_AUDIENCE", "engineers");
    let prompt = prompt_with(vec![arg("audience", false)]);
    let parsed = parse_arguments("", &prompt, &ctx()).unwrap();
    std::env::remove_var("PROMPT_AUDIENCE");
    assert_eq!(parsed.values["audience"], serde_json::json!("engineers"));
    assert_eq!(parsed.sources["audience"], ArgumentSource::Environment);
}

#[test]
#[serial]
fn unfilled_optional_argument_is_empty_fallback() {
    let prompt = prompt_with(vec![arg("extra", false)]);
    let parsed = parse_arguments("", &prompt, &ctx()).unwrap();
    assert_eq!(parsed.values["extra"], serde_json::json!(""));
    assert_eq!(parsed.sources["extra"], ArgumentSource::EmptyFallback);
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn missing_required_argument_fails_with_code() {
    let prompt = prompt_with(vec![arg("name", true)]);
    let err = parse_arguments("", &prompt, &ctx()).unwrap_err();
    let ArgumentError::Validation { issues } = err;
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].code, IssueCode::RequiredArgumentMissing);
    assert_eq!(issues[0].argument, "name");
    assert!(!issues[0].example.is_empty());
}

#[test]
fn placeholder_value_counts_as_missing() {
    let prompt = prompt_with(vec![arg("name", true)]);
    let err = parse_arguments("name=\"[name to be provided]\"", &prompt, &ctx()).unwrap_err();
    let ArgumentError::Validation { issues } = err;
    assert_eq!(issues[0].code, IssueCode::RequiredArgumentMissing);
}

#[test]
fn min_length_violation_is_length_bound() {
    let mut spec = arg("topic", true);
    spec.validation = Some(ArgumentValidation {
        min_length: Some(5),
        max_length: None,
        pattern: None,
    });
    let prompt = prompt_with(vec![spec]);
    let err = parse_arguments("topic=ab", &prompt, &ctx()).unwrap_err();
    let ArgumentError::Validation { issues } = err;
    assert_eq!(issues[0].code, IssueCode::LengthBound);
}

#[test]
fn pattern_violation_is_pattern_mismatch() {
    let mut spec = arg("slug", true);
    spec.validation = Some(ArgumentValidation {
        min_length: None,
        max_length: None,
        pattern: Some("^[a-z-]+$".to_string()),
    });
    let prompt = prompt_with(vec![spec]);
    let err = parse_arguments("slug=Not_A_Slug", &prompt, &ctx()).unwrap_err();
    let ArgumentError::Validation { issues } = err;
    assert_eq!(issues[0].code, IssueCode::PatternMismatch);
}

#[test]
fn error_message_names_code_and_argument() {
    let prompt = prompt_with(vec![arg("name", true)]);
    let err = parse_arguments("", &prompt, &ctx()).unwrap_err();
    let text = err.to_string();
    assert!(text.contains("REQUIRED_ARGUMENT_MISSING"));
    assert!(text.contains("name"));
}

// =============================================================================
// Request option merging
// =============================================================================

#[test]
fn options_fill_unfilled_slots_only() {
    let mut args = IndexMap::new();
    args.insert("a".to_string(), serde_json::json!(""));
    args.insert("b".to_string(), serde_json::json!("kept"));
    args.insert("c".to_string(), serde_json::Value::Null);
    args.insert("d".to_string(), serde_json::json!([]));

    let mut options = HashMap::new();
    for key in ["a", "b", "c", "d", "e"] {
        options.insert(key.to_string(), serde_json::json!("opt"));
    }
    merge_request_options(&mut args, &options);

    assert_eq!(args["a"], serde_json::json!("opt"));
    assert_eq!(args["b"], serde_json::json!("kept"));
    assert_eq!(args["c"], serde_json::json!("opt"));
    assert_eq!(args["d"], serde_json::json!("opt"));
    assert_eq!(args["e"], serde_json::json!("opt"));
}
