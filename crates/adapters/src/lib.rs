// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! px-adapters: subprocess and notification adapters.
//!
//! The engine treats script-tool execution and notification emission as
//! replaceable capabilities; this crate provides the production
//! implementations plus fakes for tests.

pub mod notify;
pub mod script;
pub mod shell_gate;
pub mod subprocess;

pub use notify::{DesktopNotifyAdapter, NoOpNotifyAdapter, NotifyAdapter, NotifyError};
#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifyAdapter, NotifyCall};
#[cfg(any(test, feature = "test-support"))]
pub use script::{FakeScriptExecutor, ScriptCall};
pub use script::{ScriptError, ScriptExecutor, ScriptOutcome, SubprocessScriptExecutor};
pub use shell_gate::{run_shell_verify, ShellGateError, ShellVerdict};
pub use subprocess::{run_with_timeout, GATE_TIMEOUT, SCRIPT_TOOL_TIMEOUT};
