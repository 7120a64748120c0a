// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stage: framework (methodology) resolution.

use crate::context::ExecutionContext;
use crate::error::EngineError;
use crate::framework::resolve_framework;
use crate::orchestrator::Engine;
use px_adapters::ScriptExecutor;
use px_core::{Clock, NotificationEvent};

impl<S: ScriptExecutor, C: Clock + Clone> Engine<S, C> {
    pub(crate) fn stage_framework(&self, ctx: &mut ExecutionContext) -> Result<(), EngineError> {
        let plan = ctx.plan()?;
        let override_id = plan.modifiers.framework_override.clone();
        let prompt_name = ctx
            .parsed_command
            .as_ref()
            .and_then(|p| self.registries.prompts.get(&p.prompt_id))
            .map(|p| p.name.clone())
            .unwrap_or_default();

        let resolved = resolve_framework(
            &self.registries,
            override_id.as_deref(),
            self.config.default_framework.as_deref(),
            &prompt_name,
        )?;

        if let Some(fw) = &resolved {
            let default = self.config.default_framework.as_deref().map(px_core::fold_id);
            if override_id.is_some() && default.as_deref() != Some(fw.framework_id.as_str()) {
                ctx.push_event(NotificationEvent::FrameworkChanged {
                    previous: default,
                    current: fw.framework_id.clone(),
                });
            }
        }
        ctx.framework_context = resolved;
        Ok(())
    }
}
