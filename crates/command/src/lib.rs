// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! px-command: symbolic command parsing, argument parsing, and the
//! template engine.
//!
//! Everything here is pure with respect to the registries: the parser
//! receives a [`PromptLookup`] snapshot and never touches shared state,
//! so `parse_command(s)` is a pure function of its inputs.

pub mod args;
pub mod parser;
pub mod suggest;
pub mod template;

pub use args::{
    merge_request_options, parse_arguments, parse_raw_values, ArgumentContext, ArgumentError,
    ArgumentIssue, ArgumentSource, IssueCode, ParseStrategy, ParsedArguments,
};
pub use parser::{parse_command, CommandParseError, PromptLookup};
pub use suggest::{edit_distance, find_similar, format_suggestion};
pub use template::{render, NoRefs, RefSource, ScriptSource, TemplateError};
