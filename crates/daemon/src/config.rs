// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration.
//!
//! Fixed paths live under the state directory; engine options come from
//! an optional `px.toml` in the state directory, with environment
//! overrides on top.

use crate::env;
use crate::lifecycle::LifecycleError;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default TTL for idle chain sessions.
const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Engine options from `px.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    /// Parent directory of the resource tree
    #[serde(default)]
    pub resources: Option<PathBuf>,
    /// Methodology applied when no `@` override is present
    #[serde(default)]
    pub default_framework: Option<String>,
    #[serde(default)]
    pub session_ttl_secs: Option<u64>,
    /// Global injection defaults (hierarchy level 6)
    #[serde(default)]
    pub inject_system_prompt: Option<bool>,
    #[serde(default)]
    pub inject_gate_guidance: Option<bool>,
    #[serde(default)]
    pub inject_style_guidance: Option<bool>,
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/px)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Path to the session journal
    pub sessions_path: PathBuf,
    /// Path to the resource change journal
    pub changes_path: PathBuf,
    /// Parent directory of the resource tree (None: loader resolution)
    pub resources_root: Option<PathBuf>,
    pub default_framework: Option<String>,
    pub session_ttl: Duration,
    pub injection_defaults: px_core::InjectionAnnotations,
}

impl Config {
    /// Load configuration for the user-level daemon.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;
        let file = read_config_file(&state_dir);

        let resources_root = env::resources_root().or(file.resources.clone());
        let session_ttl = env::session_ttl()
            .or(file.session_ttl_secs.map(Duration::from_secs))
            .unwrap_or(DEFAULT_SESSION_TTL);

        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            sessions_path: state_dir.join("sessions").join("sessions.jsonl"),
            changes_path: state_dir.join("changes.jsonl"),
            resources_root,
            default_framework: file.default_framework.clone(),
            session_ttl,
            injection_defaults: px_core::InjectionAnnotations {
                system_prompt: file.inject_system_prompt,
                gate_guidance: file.inject_gate_guidance,
                style_guidance: file.inject_style_guidance,
            },
            state_dir,
        })
    }
}

fn read_config_file(state_dir: &std::path::Path) -> ConfigFile {
    let path = state_dir.join("px.toml");
    let Ok(text) = std::fs::read_to_string(&path) else {
        return ConfigFile::default();
    };
    match toml::from_str(&text) {
        Ok(file) => file,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring malformed px.toml");
            ConfigFile::default()
        }
    }
}
