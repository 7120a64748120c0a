// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! px-registry: hot-reloadable stores for prompts, gates, styles, and
//! methodology frameworks, loaded from a YAML resource tree.

pub mod loader;
pub mod registry;
pub mod reload;
pub mod tracker;

pub use loader::{
    load_framework, load_gate, load_prompt, load_style, load_tree, resolve_root, LoaderError,
    ResourceKind,
};
pub use registry::{Registry, RegistryItem, RegistrySet};
pub use reload::{ReloadCoordinator, ReloadHandle};
pub use tracker::{ChangeKind, ChangeOrigin, ChangeRecord, ExternalChange, ResourceChangeTracker};
