// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn minimal_prompt(id: &str) -> PromptDefinition {
    PromptDefinition {
        id: id.to_string(),
        name: id.to_string(),
        category: "general".to_string(),
        system_message: None,
        user_message_template: "Hello, {{name}}!".to_string(),
        arguments: vec![],
        chain_steps: vec![],
        gate_configuration: None,
        script_tools: vec![],
        injection: None,
        prompt_dir: None,
    }
}

#[test]
fn prompt_without_steps_is_not_a_chain() {
    assert!(!minimal_prompt("greet").is_chain());
}

#[test]
fn prompt_with_steps_is_a_chain() {
    let mut prompt = minimal_prompt("pipeline");
    prompt.chain_steps.push(ChainStep {
        step_number: 1,
        prompt_id: "clarify".to_string(),
        args: IndexMap::new(),
        variable_name: None,
        input_mapping: HashMap::new(),
        output_mapping: HashMap::new(),
        retries: 0,
        execution_plan: None,
        injection: None,
    });
    assert!(prompt.is_chain());
}

#[test]
fn chain_step_output_variable_defaults_to_step_number() {
    let step = ChainStep {
        step_number: 2,
        prompt_id: "plan".to_string(),
        args: IndexMap::new(),
        variable_name: None,
        input_mapping: HashMap::new(),
        output_mapping: HashMap::new(),
        retries: 0,
        execution_plan: None,
        injection: None,
    };
    assert_eq!(step.output_variable(), "step_2");
}

#[test]
fn chain_step_output_variable_uses_bound_name() {
    let step = ChainStep {
        step_number: 1,
        prompt_id: "clarify".to_string(),
        args: IndexMap::new(),
        variable_name: Some("clarified".to_string()),
        input_mapping: HashMap::new(),
        output_mapping: HashMap::new(),
        retries: 0,
        execution_plan: None,
        injection: None,
    };
    assert_eq!(step.output_variable(), "clarified");
}

#[test]
fn argument_lookup_by_name() {
    let mut prompt = minimal_prompt("greet");
    prompt.arguments.push(ArgumentSpec {
        name: "name".to_string(),
        arg_type: ArgumentType::String,
        required: true,
        description: String::new(),
        default_value: None,
        validation: None,
    });
    assert!(prompt.argument("name").is_some());
    assert!(prompt.argument("missing").is_none());
    assert_eq!(prompt.required_arguments().count(), 1);
}

#[test]
fn argument_spec_deserializes_from_yaml_shape() {
    let json = serde_json::json!({
        "name": "topic",
        "type": "string",
        "required": true,
        "description": "what to analyze",
        "validation": { "min_length": 3 }
    });
    let spec: ArgumentSpec = serde_json::from_value(json).unwrap();
    assert_eq!(spec.arg_type, ArgumentType::String);
    assert_eq!(spec.validation.unwrap().min_length, Some(3));
}

#[test]
fn script_tool_mode_serde_round_trip() {
    let tool = ScriptTool {
        id: "lint".to_string(),
        name: "Linter".to_string(),
        command: "lint.sh".to_string(),
        args: vec![],
        mode: ScriptToolMode::AutoApproveOnValid,
        triggers: vec!["lint".to_string()],
    };
    let json = serde_json::to_string(&tool).unwrap();
    assert!(json.contains("auto_approve_on_valid"));
    let parsed: ScriptTool = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, tool);
}
