// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hot-reload coordinator.
//!
//! Watches one resource root for YAML changes. On a change event the
//! affected resource directory is re-parsed and re-validated; on success
//! the registry entry is swapped atomically, on failure the previous
//! entry is retained and the failure logged. Every change is journaled
//! through the [`ResourceChangeTracker`].

use crate::loader::{dir_resource_id, owning_resource_dir, LoaderError};
use crate::registry::{Registry, RegistryItem};
use crate::tracker::{ChangeOrigin, ResourceChangeTracker};
use notify::{RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("watcher error: {0}")]
    Watch(String),
}

/// Loader callback re-parsing one resource directory.
pub type LoadFn<T> = dyn Fn(&Path) -> Result<T, LoaderError> + Send + Sync;

/// Coordinates reloads for one registry.
pub struct ReloadCoordinator<T> {
    root: PathBuf,
    registry: Arc<Registry<T>>,
    tracker: Arc<ResourceChangeTracker>,
    load_one: Box<LoadFn<T>>,
}

impl<T: RegistryItem> ReloadCoordinator<T> {
    pub fn new(
        root: PathBuf,
        registry: Arc<Registry<T>>,
        tracker: Arc<ResourceChangeTracker>,
        load_one: impl Fn(&Path) -> Result<T, LoaderError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            root,
            registry,
            tracker,
            load_one: Box::new(load_one),
        }
    }

    /// Apply one observed path change synchronously.
    ///
    /// Classifies the change as added/modified/removed by re-inspecting
    /// the owning resource directory, then swaps or drops the registry
    /// entry. Invalid definitions never evict a valid predecessor.
    pub fn apply_change(&self, changed: &Path) {
        let Some(dir) = owning_resource_dir(&self.root, changed) else {
            return;
        };
        let Some(id) = dir_resource_id(&dir) else {
            return;
        };

        // Journal the file-level change first
        if changed.is_file() {
            if let Ok(bytes) = std::fs::read(changed) {
                if let Err(e) = self
                    .tracker
                    .record(changed, Some(&bytes), ChangeOrigin::Filesystem)
                {
                    tracing::warn!(error = %e, "failed to journal resource change");
                }
            }
        } else if !changed.exists() {
            if let Err(e) = self.tracker.record(changed, None, ChangeOrigin::Filesystem) {
                tracing::warn!(error = %e, "failed to journal resource removal");
            }
        }

        if !dir.exists() {
            if self.registry.remove(&id).is_some() {
                tracing::info!(%id, "resource removed");
            }
            return;
        }

        match (self.load_one)(&dir) {
            Ok(item) => {
                let verb = if self.registry.contains(&id) {
                    "modified"
                } else {
                    "added"
                };
                self.registry.insert(item);
                tracing::info!(%id, change = verb, "resource reloaded");
            }
            Err(e) => {
                tracing::warn!(%id, error = %e, "reload failed; retaining previous definition");
            }
        }
    }

    /// Start watching the root on a background thread. The returned handle
    /// keeps the watcher alive; dropping it stops the watch loop.
    pub fn watch(self) -> Result<ReloadHandle, ReloadError> {
        let (tx, rx) = mpsc::channel::<notify::Result<notify::Event>>();
        let mut watcher =
            notify::recommended_watcher(tx).map_err(|e| ReloadError::Watch(e.to_string()))?;
        watcher
            .watch(&self.root, RecursiveMode::Recursive)
            .map_err(|e| ReloadError::Watch(e.to_string()))?;

        let thread = std::thread::spawn(move || {
            for event in rx {
                match event {
                    Ok(event) => {
                        for path in event.paths {
                            self.apply_change(&path);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "watch error");
                    }
                }
            }
            tracing::debug!("watch channel closed; reload loop exiting");
        });

        Ok(ReloadHandle {
            _watcher: watcher,
            _thread: thread,
        })
    }
}

/// Keeps a watcher (and its event loop) alive.
pub struct ReloadHandle {
    _watcher: notify::RecommendedWatcher,
    _thread: std::thread::JoinHandle<()>,
}

#[cfg(test)]
#[path = "reload_tests.rs"]
mod tests;
