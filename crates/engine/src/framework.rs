// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Framework (methodology) resolution and the double-injection guard.

use crate::context::FrameworkContext;
use crate::error::EngineError;
use px_command::find_similar;
use px_core::MethodologyGuide;
use px_registry::RegistrySet;

/// Resolve the active methodology for a request.
///
/// Precedence: the command's `@` override, then the configured default.
/// An unknown override is an error (with suggestions); an unknown default
/// is ignored with a warning so a bad config cannot brick every request.
pub fn resolve_framework(
    registries: &RegistrySet,
    override_id: Option<&str>,
    default_id: Option<&str>,
    prompt_name: &str,
) -> Result<Option<FrameworkContext>, EngineError> {
    let definition = match override_id {
        Some(id) => Some(registries.frameworks.get(id).ok_or_else(|| {
            EngineError::ResourceNotFound {
                kind: "framework",
                id: id.to_string(),
                suggestions: find_similar(&px_core::fold_id(id), &registries.frameworks.ids()),
            }
        })?),
        None => match default_id {
            Some(id) => {
                let found = registries.frameworks.get(id);
                if found.is_none() {
                    tracing::warn!(%id, "configured default framework is not registered");
                }
                found
            }
            None => None,
        },
    };

    Ok(definition.map(|def| {
        let guide = MethodologyGuide::new(def.as_ref().clone());
        FrameworkContext {
            framework_id: def.id.clone(),
            system_prompt: guide.render_system_prompt(prompt_name),
            marker: def.marker(),
        }
    }))
}

/// The double-injection guard: true when the prompt's own system message
/// already carries the framework's canonical marker substring.
pub fn already_injected(system_message: Option<&str>, marker: &str) -> bool {
    if marker.is_empty() {
        return false;
    }
    system_message.is_some_and(|m| m.contains(marker))
}

#[cfg(test)]
#[path = "framework_tests.rs"]
mod tests;
