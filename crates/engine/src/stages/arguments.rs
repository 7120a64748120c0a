// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage: argument parsing.
//!
//! Co-located with command parsing in spirit: fills the parsed command's
//! typed argument maps. The first prompt's payload is validated against
//! its schema; chain step payloads are parsed leniently and validated at
//! render time. Request options are merged last and only fill slots whose
//! current value is an unfilled placeholder.

use crate::context::ExecutionContext;
use crate::error::EngineError;
use crate::orchestrator::Engine;
use px_adapters::ScriptExecutor;
use px_command::{merge_request_options, parse_arguments, parse_raw_values, ArgumentContext};
use px_core::Clock;

impl<S: ScriptExecutor, C: Clock + Clone> Engine<S, C> {
    pub(crate) fn stage_arguments(&self, ctx: &mut ExecutionContext) -> Result<(), EngineError> {
        if ctx.state.normalization.response_only {
            return Ok(());
        }
        let parsed = ctx
            .parsed_command
            .as_mut()
            .ok_or_else(|| EngineError::Internal("parsed command not set".into()))?;
        let prompt = self
            .registries
            .prompts
            .get(&parsed.prompt_id)
            .ok_or_else(|| EngineError::Internal("parsed prompt vanished from registry".into()))?;

        let arg_ctx = ArgumentContext {
            prompt_defaults: self.config.prompt_defaults.clone(),
        };
        let args = parse_arguments(&parsed.raw_args, &prompt, &arg_ctx)?;
        parsed.prompt_args = args.values;
        merge_request_options(&mut parsed.prompt_args, &ctx.state.normalization.options);

        for step in &mut parsed.steps {
            if !step.raw_args.is_empty() {
                let step_prompt = self.registries.prompts.get(&step.prompt_id);
                if let Some(step_prompt) = step_prompt {
                    let values = parse_raw_values(&step.raw_args, &step_prompt);
                    for (k, v) in values {
                        step.args.insert(k, v);
                    }
                }
            }
            merge_request_options(&mut step.args, &ctx.state.normalization.options);
        }
        Ok(())
    }
}
