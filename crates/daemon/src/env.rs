// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: PX_STATE_DIR > XDG_STATE_HOME/px > ~/.local/state/px
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("PX_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("px"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/px"))
}

/// Resources root override (parent of prompts/gates/styles/methodologies)
pub fn resources_root() -> Option<PathBuf> {
    std::env::var("PX_RESOURCES_PATH").ok().map(PathBuf::from)
}

/// Session TTL override
pub fn session_ttl() -> Option<Duration> {
    std::env::var("PX_SESSION_TTL_SECS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Desktop notifications toggle (`PX_NOTIFY=desktop`)
pub fn desktop_notifications() -> bool {
    std::env::var("PX_NOTIFY").map(|v| v == "desktop").unwrap_or(false)
}
