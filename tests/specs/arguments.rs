//! Argument coercion round-trip and option merging specs.

use indexmap::IndexMap;
use px_command::{merge_request_options, parse_arguments, ArgumentContext};
use px_core::{ArgumentSpec, ArgumentType, PromptDefinition};
use serde_json::Value;
use std::collections::HashMap;

fn prompt_with_typed(name: &str, arg_type: ArgumentType) -> PromptDefinition {
    PromptDefinition {
        id: "typed".to_string(),
        name: "typed".to_string(),
        category: String::new(),
        system_message: None,
        user_message_template: String::new(),
        arguments: vec![ArgumentSpec {
            name: name.to_string(),
            arg_type,
            required: true,
            description: String::new(),
            default_value: None,
            validation: None,
        }],
        chain_steps: vec![],
        gate_configuration: None,
        script_tools: vec![],
        injection: None,
        prompt_dir: None,
    }
}

fn text_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[test]
fn coercion_round_trips_typed_values() {
    let cases = [
        (ArgumentType::Number, serde_json::json!(42)),
        (ArgumentType::Number, serde_json::json!(-7)),
        (ArgumentType::Boolean, serde_json::json!(true)),
        (ArgumentType::Boolean, serde_json::json!(false)),
        (ArgumentType::Array, serde_json::json!(["a", "b", "c"])),
        (ArgumentType::Object, serde_json::json!({"k": "v", "n": 3})),
        (ArgumentType::String, serde_json::json!("plain text")),
    ];
    for (arg_type, value) in cases {
        let prompt = prompt_with_typed("v", arg_type);
        let raw = format!("v={}", quote_for_kv(&text_form(&value)));
        let parsed = parse_arguments(&raw, &prompt, &ArgumentContext::default()).unwrap();
        assert_eq!(parsed.values["v"], value, "round trip failed for {value}");
    }
}

fn quote_for_kv(text: &str) -> String {
    if text.contains(' ') || text.contains('"') {
        format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        text.to_string()
    }
}

#[test]
fn request_options_never_override_truthy_inline_values() {
    let mut args: IndexMap<String, Value> = IndexMap::new();
    args.insert("filled".to_string(), serde_json::json!("inline"));
    args.insert("empty".to_string(), serde_json::json!(""));

    let mut options = HashMap::new();
    options.insert("filled".to_string(), serde_json::json!("from options"));
    options.insert("empty".to_string(), serde_json::json!("from options"));
    options.insert("new".to_string(), serde_json::json!("from options"));

    merge_request_options(&mut args, &options);
    assert_eq!(args["filled"], serde_json::json!("inline"));
    assert_eq!(args["empty"], serde_json::json!("from options"));
    assert_eq!(args["new"], serde_json::json!("from options"));
}
