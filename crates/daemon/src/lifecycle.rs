// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, registry loading, shutdown.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use fs2::FileExt;
use px_adapters::{DesktopNotifyAdapter, NoOpNotifyAdapter, SubprocessScriptExecutor};
use px_core::SystemClock;
use px_engine::{spawn_notify_task, Engine, EngineConfig, NotificationSender};
use px_registry::{
    load_framework, load_gate, load_prompt, load_style, load_tree, resolve_root,
    ReloadCoordinator, ReloadHandle, ResourceChangeTracker, ResourceKind,
};
use px_storage::SessionStore;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::env;

/// The daemon's engine with concrete adapter types.
pub type DaemonEngine = Engine<SubprocessScriptExecutor, SystemClock>;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("no usable state directory (HOME unset)")]
    NoStateDir,
    #[error("another daemon holds the lock at {}", .0.display())]
    LockFailed(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("session store error: {0}")]
    Store(#[from] px_storage::StoreError),
    #[error("change tracker error: {0}")]
    Tracker(#[from] px_registry::tracker::TrackerError),
    #[error("reload error: {0}")]
    Reload(#[from] px_registry::reload::ReloadError),
}

/// Everything a started daemon owns.
pub struct StartupResult {
    pub engine: Arc<DaemonEngine>,
    pub listener: UnixListener,
    /// Keeps the watchers (and their threads) alive
    pub reload_handles: Vec<ReloadHandle>,
    /// Keeps the notification task alive
    pub notify_handle: tokio::task::JoinHandle<()>,
    // NOTE(lifetime): Held to maintain exclusive file lock; released on drop
    #[allow(dead_code)]
    lock_file: File,
}

/// Bring the daemon up: lock, load registries, surface external changes,
/// start the watchers, open the session store, bind the socket.
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    let lock_file = acquire_lock(&config.lock_path)?;

    let registries = px_registry::RegistrySet::new();
    let tracker = Arc::new(ResourceChangeTracker::open(&config.changes_path)?);

    let prompts_root = resolve_root(ResourceKind::Prompts, config.resources_root.as_deref());
    let gates_root = resolve_root(ResourceKind::Gates, config.resources_root.as_deref());
    let styles_root = resolve_root(ResourceKind::Styles, config.resources_root.as_deref());
    let methodologies_root =
        resolve_root(ResourceKind::Methodologies, config.resources_root.as_deref());

    registries
        .prompts
        .replace_all(load_tree(&prompts_root, load_prompt));
    registries.gates.replace_all(load_tree(&gates_root, load_gate));
    registries
        .styles
        .replace_all(load_tree(&styles_root, load_style));
    registries
        .frameworks
        .replace_all(load_tree(&methodologies_root, load_framework));
    info!(
        prompts = registries.prompts.len(),
        gates = registries.gates.len(),
        styles = registries.styles.len(),
        frameworks = registries.frameworks.len(),
        "registries loaded"
    );

    // Surface changes made while the daemon was down
    let root_paths = vec![
        prompts_root.clone(),
        gates_root.clone(),
        styles_root.clone(),
        methodologies_root.clone(),
    ];
    for change in tracker.startup_diff(&root_paths) {
        info!(path = %change.path.display(), kind = ?change.kind, "external resource change");
    }

    let mut reload_handles = Vec::new();
    if prompts_root.is_dir() {
        reload_handles.push(
            ReloadCoordinator::new(
                prompts_root,
                Arc::clone(&registries.prompts),
                Arc::clone(&tracker),
                load_prompt,
            )
            .watch()?,
        );
    }
    if gates_root.is_dir() {
        reload_handles.push(
            ReloadCoordinator::new(
                gates_root,
                Arc::clone(&registries.gates),
                Arc::clone(&tracker),
                load_gate,
            )
            .watch()?,
        );
    }
    if styles_root.is_dir() {
        reload_handles.push(
            ReloadCoordinator::new(
                styles_root,
                Arc::clone(&registries.styles),
                Arc::clone(&tracker),
                load_style,
            )
            .watch()?,
        );
    }
    if methodologies_root.is_dir() {
        reload_handles.push(
            ReloadCoordinator::new(
                methodologies_root,
                Arc::clone(&registries.frameworks),
                Arc::clone(&tracker),
                load_framework,
            )
            .watch()?,
        );
    }

    let store = Arc::new(SessionStore::open(
        &config.sessions_path,
        config.session_ttl,
        SystemClock,
    )?);
    info!(sessions = store.len(), "session store opened");

    let (notifications, notify_handle) = start_notifications();

    let engine_config = EngineConfig {
        default_framework: config.default_framework.clone(),
        injection: px_engine::InjectionConfig {
            global: config.injection_defaults,
            category_rules: Default::default(),
        },
        prompt_defaults: Default::default(),
    };
    let engine = Arc::new(Engine::new(
        registries,
        store,
        SubprocessScriptExecutor::new(),
        notifications,
        SystemClock,
        engine_config,
    ));

    let _ = std::fs::remove_file(&config.socket_path);
    let listener = UnixListener::bind(&config.socket_path)?;
    info!(socket = %config.socket_path.display(), "listening");

    Ok(StartupResult {
        engine,
        listener,
        reload_handles,
        notify_handle,
        lock_file,
    })
}

fn start_notifications() -> (NotificationSender, tokio::task::JoinHandle<()>) {
    if env::desktop_notifications() {
        spawn_notify_task(DesktopNotifyAdapter::new())
    } else {
        spawn_notify_task(NoOpNotifyAdapter::new())
    }
}

fn acquire_lock(lock_path: &PathBuf) -> Result<File, LifecycleError> {
    let mut lock_file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(lock_path)?;
    if lock_file.try_lock_exclusive().is_err() {
        return Err(LifecycleError::LockFailed(lock_path.clone()));
    }
    let _ = writeln!(lock_file, "{}", std::process::id());
    Ok(lock_file)
}

/// Remove the socket and pid files on the way out.
pub fn shutdown_cleanup(config: &Config) {
    if let Err(e) = std::fs::remove_file(&config.socket_path) {
        warn!(error = %e, "failed to remove socket file");
    }
    let _ = std::fs::remove_file(&config.lock_path);
}
