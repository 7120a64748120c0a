// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Read-mostly registries with atomic entry swap.
//!
//! Each registry maps folded IDs to `Arc`'d definitions. Readers clone the
//! `Arc` and keep a consistent view for as long as they hold it; the
//! hot-reload coordinator swaps entries under a short write lock, so an
//! in-flight request never observes a half-mutated definition.

use parking_lot::RwLock;
use px_command::PromptLookup;
use px_core::{
    fold_id, FrameworkDefinition, GateDefinition, PromptDefinition, StyleDefinition,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Anything storable in a [`Registry`]: identified and nameable.
pub trait RegistryItem: Send + Sync + 'static {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
}

impl RegistryItem for PromptDefinition {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl RegistryItem for GateDefinition {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl RegistryItem for StyleDefinition {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

impl RegistryItem for FrameworkDefinition {
    fn id(&self) -> &str {
        &self.id
    }
    fn name(&self) -> &str {
        &self.name
    }
}

/// Case-insensitive ID/name store for one resource kind.
pub struct Registry<T> {
    entries: RwLock<Inner<T>>,
}

struct Inner<T> {
    by_id: HashMap<String, Arc<T>>,
    /// folded name -> folded id
    by_name: HashMap<String, String>,
}

impl<T: RegistryItem> Registry<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Inner {
                by_id: HashMap::new(),
                by_name: HashMap::new(),
            }),
        }
    }

    /// Look up by ID or name, case-insensitive.
    pub fn get(&self, id_or_name: &str) -> Option<Arc<T>> {
        let key = fold_id(id_or_name);
        let inner = self.entries.read();
        if let Some(item) = inner.by_id.get(&key) {
            return Some(Arc::clone(item));
        }
        inner
            .by_name
            .get(&key)
            .and_then(|id| inner.by_id.get(id))
            .map(Arc::clone)
    }

    pub fn contains(&self, id_or_name: &str) -> bool {
        self.get(id_or_name).is_some()
    }

    /// Insert or replace an entry. The swap is atomic with respect to
    /// readers: they see either the old or the new definition, never a mix.
    pub fn insert(&self, item: T) {
        let id_key = fold_id(item.id());
        let name_key = fold_id(item.name());
        let mut inner = self.entries.write();
        if let Some(old) = inner.by_id.get(&id_key).map(Arc::clone) {
            let old_name = fold_id(old.name());
            if old_name != name_key {
                inner.by_name.remove(&old_name);
            }
        }
        inner.by_name.insert(name_key, id_key.clone());
        inner.by_id.insert(id_key, Arc::new(item));
    }

    pub fn remove(&self, id: &str) -> Option<Arc<T>> {
        let key = fold_id(id);
        let mut inner = self.entries.write();
        let removed = inner.by_id.remove(&key)?;
        let name_key = fold_id(removed.name());
        if inner.by_name.get(&name_key).is_some_and(|v| *v == key) {
            inner.by_name.remove(&name_key);
        }
        Some(removed)
    }

    /// Folded IDs of every entry, sorted.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.entries.read().by_id.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Snapshot of every entry.
    pub fn all(&self) -> Vec<Arc<T>> {
        self.entries.read().by_id.values().map(Arc::clone).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().by_id.is_empty()
    }

    /// Replace the whole registry contents (initial load).
    pub fn replace_all(&self, items: Vec<T>) {
        let mut by_id = HashMap::new();
        let mut by_name = HashMap::new();
        for item in items {
            let id_key = fold_id(item.id());
            by_name.insert(fold_id(item.name()), id_key.clone());
            by_id.insert(id_key, Arc::new(item));
        }
        let mut inner = self.entries.write();
        inner.by_id = by_id;
        inner.by_name = by_name;
    }
}

impl<T: RegistryItem> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// The four registries the pipeline reads.
#[derive(Clone, Default)]
pub struct RegistrySet {
    pub prompts: Arc<Registry<PromptDefinition>>,
    pub gates: Arc<Registry<GateDefinition>>,
    pub styles: Arc<Registry<StyleDefinition>>,
    pub frameworks: Arc<Registry<FrameworkDefinition>>,
}

impl RegistrySet {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PromptLookup for RegistrySet {
    fn resolve(&self, id_or_name: &str) -> Option<Arc<PromptDefinition>> {
        self.prompts.get(id_or_name)
    }

    fn prompt_ids(&self) -> Vec<String> {
        self.prompts.ids()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
