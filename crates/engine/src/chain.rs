// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chain operator execution helpers.
//!
//! A chain renders one step per resume. Before rendering, chain-global
//! variables are translated into the step's argument namespace through the
//! step's `input_mapping`; after the step's output arrives (on the next
//! resume) it is bound back into the chain namespace via `variable_name`
//! and `output_mapping`.

use indexmap::IndexMap;
use px_core::{ChainStep, ParsedStep, SessionBlueprint};
use serde_json::Value;
use std::collections::HashMap;

/// Build the argument map a chain step is rendered with.
///
/// Precedence (last wins): the chain's parent args, the parsed step's
/// args, the definition step's args, chain variables through
/// `input_mapping`, then the standard `previous_step_result` binding.
pub fn build_step_args(
    parent_args: &IndexMap<String, Value>,
    parsed_step: &ParsedStep,
    step_def: Option<&ChainStep>,
    variables: &HashMap<String, String>,
    previous_step_result: Option<&str>,
) -> IndexMap<String, Value> {
    let mut args = parent_args.clone();
    for (k, v) in &parsed_step.args {
        args.insert(k.clone(), v.clone());
    }
    if let Some(def) = step_def {
        for (k, v) in &def.args {
            args.insert(k.clone(), v.clone());
        }
        for (chain_var, arg_name) in &def.input_mapping {
            if let Some(value) = variables.get(chain_var) {
                args.insert(arg_name.clone(), Value::String(value.clone()));
            }
        }
    }
    // Every chain variable is also visible under its own name, unless the
    // step shadowed it explicitly.
    for (name, value) in variables {
        args.entry(name.clone())
            .or_insert_with(|| Value::String(value.clone()));
    }
    if let Some(result) = previous_step_result {
        args.insert(
            "previous_step_result".to_string(),
            Value::String(result.to_string()),
        );
    }
    args
}

/// Bind a completed step's output into the chain-global namespace.
pub fn bind_step_output(
    blueprint: &mut SessionBlueprint,
    step_def: Option<&ChainStep>,
    step_number: u32,
    output: &str,
) {
    let variable = step_def
        .map(ChainStep::output_variable)
        .unwrap_or_else(|| format!("step_{step_number}"));
    blueprint.bind_variable(variable.clone(), output);
    if let Some(def) = step_def {
        for (from, to) in &def.output_mapping {
            if from == "result" || *from == variable {
                blueprint.bind_variable(to.clone(), output);
            }
        }
    }
}

#[cfg(test)]
#[path = "chain_tests.rs"]
mod tests;
