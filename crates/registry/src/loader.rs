// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! YAML resource loaders.
//!
//! Resources live under `resources/{prompts,gates,styles,methodologies}/<id>/`,
//! each directory holding a primary `<type>.yaml` plus optional companion
//! files (`guidance.md`, `user-message.md`) inlined into the definition
//! on load.

use px_core::{fold_id, FrameworkDefinition, GateDefinition, PromptDefinition, StyleDefinition};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// The four resource registries and their on-disk names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Prompts,
    Gates,
    Styles,
    Methodologies,
}

impl ResourceKind {
    /// Directory name under the resources root.
    pub fn dir_name(self) -> &'static str {
        match self {
            ResourceKind::Prompts => "prompts",
            ResourceKind::Gates => "gates",
            ResourceKind::Styles => "styles",
            ResourceKind::Methodologies => "methodologies",
        }
    }

    /// Primary definition file inside a resource directory.
    pub fn file_name(self) -> &'static str {
        match self {
            ResourceKind::Prompts => "prompt.yaml",
            ResourceKind::Gates => "gate.yaml",
            ResourceKind::Styles => "style.yaml",
            ResourceKind::Methodologies => "methodology.yaml",
        }
    }

    /// Environment variable overriding this kind's root directory.
    pub fn env_var(self) -> &'static str {
        match self {
            ResourceKind::Prompts => "PX_PROMPTS_PATH",
            ResourceKind::Gates => "PX_GATES_PATH",
            ResourceKind::Styles => "PX_STYLES_PATH",
            ResourceKind::Methodologies => "PX_METHODOLOGIES_PATH",
        }
    }
}

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error in {}: {message}", .path.display())]
    Yaml { path: PathBuf, message: String },
    #[error("definition in {} has no id and no directory name", .path.display())]
    MissingId { path: PathBuf },
    #[error("no {kind} definition file in {}", .dir.display())]
    NotAResourceDir { kind: &'static str, dir: PathBuf },
}

/// Resolve the root directory for a resource kind.
///
/// Order: the kind's environment variable, the configured path, a walk up
/// from the working directory looking for a `resources/` anchor, then the
/// relative `resources/<kind>` fallback.
pub fn resolve_root(kind: ResourceKind, configured: Option<&Path>) -> PathBuf {
    if let Ok(path) = std::env::var(kind.env_var()) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    if let Some(root) = configured {
        return root.join(kind.dir_name());
    }
    if let Ok(mut dir) = std::env::current_dir() {
        loop {
            let candidate = dir.join("resources").join(kind.dir_name());
            if candidate.is_dir() {
                return candidate;
            }
            if !dir.pop() {
                break;
            }
        }
    }
    PathBuf::from("resources").join(kind.dir_name())
}

fn read_to_string(path: &Path) -> Result<String, LoaderError> {
    std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_yaml<T: DeserializeOwned>(path: &Path, text: &str) -> Result<T, LoaderError> {
    serde_yaml::from_str(text).map_err(|e| LoaderError::Yaml {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Read an optional companion file next to the primary definition.
fn companion(dir: &Path, file: &str) -> Option<String> {
    let path = dir.join(file);
    if path.is_file() {
        std::fs::read_to_string(&path).ok()
    } else {
        None
    }
}

fn dir_id(dir: &Path) -> Option<String> {
    dir.file_name().map(|n| n.to_string_lossy().to_string())
}

fn primary_file(kind: ResourceKind, dir: &Path) -> Result<PathBuf, LoaderError> {
    let path = dir.join(kind.file_name());
    if path.is_file() {
        Ok(path)
    } else {
        Err(LoaderError::NotAResourceDir {
            kind: kind.file_name(),
            dir: dir.to_path_buf(),
        })
    }
}

/// Load one prompt definition from its resource directory.
pub fn load_prompt(dir: &Path) -> Result<PromptDefinition, LoaderError> {
    let path = primary_file(ResourceKind::Prompts, dir)?;
    let mut prompt: PromptDefinition = parse_yaml(&path, &read_to_string(&path)?)?;
    if prompt.id.is_empty() {
        prompt.id = dir_id(dir).ok_or(LoaderError::MissingId { path })?;
    }
    if prompt.name.is_empty() {
        prompt.name = prompt.id.clone();
    }
    if let Some(template) = companion(dir, "user-message.md") {
        prompt.user_message_template = template.trim_end().to_string();
    }
    if prompt.system_message.is_none() {
        prompt.system_message = companion(dir, "system-message.md").map(|s| s.trim_end().to_string());
    }
    prompt.prompt_dir = Some(dir.to_path_buf());
    Ok(prompt)
}

/// Load one gate definition from its resource directory.
pub fn load_gate(dir: &Path) -> Result<GateDefinition, LoaderError> {
    let path = primary_file(ResourceKind::Gates, dir)?;
    let mut gate: GateDefinition = parse_yaml(&path, &read_to_string(&path)?)?;
    if gate.id.is_empty() {
        gate.id = dir_id(dir).ok_or(LoaderError::MissingId { path })?;
    }
    if gate.name.is_empty() {
        gate.name = gate.id.clone();
    }
    if let Some(guidance) = companion(dir, "guidance.md") {
        gate.guidance = guidance.trim_end().to_string();
    }
    Ok(gate)
}

/// Load one style definition from its resource directory.
pub fn load_style(dir: &Path) -> Result<StyleDefinition, LoaderError> {
    let path = primary_file(ResourceKind::Styles, dir)?;
    let mut style: StyleDefinition = parse_yaml(&path, &read_to_string(&path)?)?;
    if style.id.is_empty() {
        style.id = dir_id(dir).ok_or(LoaderError::MissingId { path })?;
    }
    if style.name.is_empty() {
        style.name = style.id.clone();
    }
    if let Some(guidance) = companion(dir, "guidance.md") {
        style.guidance = guidance.trim_end().to_string();
    }
    Ok(style)
}

/// Load one methodology framework from its resource directory.
pub fn load_framework(dir: &Path) -> Result<FrameworkDefinition, LoaderError> {
    let path = primary_file(ResourceKind::Methodologies, dir)?;
    let mut framework: FrameworkDefinition = parse_yaml(&path, &read_to_string(&path)?)?;
    if framework.id.is_empty() {
        framework.id = dir_id(dir).ok_or(LoaderError::MissingId { path })?;
    }
    if framework.name.is_empty() {
        framework.name = framework.id.clone();
    }
    if let Some(guidance) = companion(dir, "guidance.md") {
        framework.guidance = guidance.trim_end().to_string();
    }
    Ok(framework)
}

/// Load every resource directory under a root, skipping entries that fail
/// to parse (each failure is logged and the previous state retained by
/// the caller).
pub fn load_tree<T>(
    root: &Path,
    load_one: impl Fn(&Path) -> Result<T, LoaderError>,
) -> Vec<T> {
    let mut out = Vec::new();
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(root = %root.display(), error = %e, "resource root not readable");
            return out;
        }
    };
    let mut dirs: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    for dir in dirs {
        match load_one(&dir) {
            Ok(item) => out.push(item),
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "skipping unloadable resource");
            }
        }
    }
    out
}

/// Resource directory a changed file belongs to, when it is under `root`.
pub fn owning_resource_dir(root: &Path, changed: &Path) -> Option<PathBuf> {
    let rel = changed.strip_prefix(root).ok()?;
    let first = rel.components().next()?;
    let dir = root.join(first.as_os_str());
    if dir.is_dir() || !changed.exists() {
        Some(dir)
    } else {
        None
    }
}

/// Folded resource ID for a resource directory path.
pub fn dir_resource_id(dir: &Path) -> Option<String> {
    dir_id(dir).map(|id| fold_id(&id))
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
