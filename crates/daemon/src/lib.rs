// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! px-daemon: the `pxd` background process.
//!
//! Owns the execution engine, the registries with their hot-reload
//! coordinators, and the session store. Speaks a length-prefixed JSON
//! protocol over a Unix socket; the `px` CLI is the usual client.

pub mod config;
pub mod env;
pub mod lifecycle;
pub mod listener;
pub mod protocol;
pub mod wire;

pub use config::Config;
pub use lifecycle::{startup, DaemonEngine, LifecycleError, StartupResult};
pub use listener::Listener;
pub use protocol::{Request, Response, StatusInfo, PROTOCOL_VERSION};
