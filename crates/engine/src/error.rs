// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error taxonomy.
//!
//! Five kinds reach the caller: parsing failures, unknown resources,
//! argument validation failures, gate failures (non-terminal, handled by
//! the review stage), and internal faults. Every terminal error becomes a
//! response with `is_error = true` and structured metadata.

use crate::response::EngineResponse;
use px_command::suggest::format_suggestion;
use px_command::{ArgumentError, CommandParseError, TemplateError};
use px_storage::StoreError;
use thiserror::Error;

/// Machine-readable bucket attached to error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Parsing,
    ResourceNotFound,
    ArgumentValidation,
    GateFailure,
    Cancelled,
    Internal,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] CommandParseError),
    #[error(transparent)]
    Arguments(#[from] ArgumentError),
    #[error("{kind} not found: {id}{}", format_suggestion(.suggestions))]
    ResourceNotFound {
        kind: &'static str,
        id: String,
        suggestions: Vec<String>,
    },
    #[error("no chain session for id: {0}")]
    SessionNotFound(String),
    #[error("request deadline exceeded")]
    Cancelled,
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("session store error: {0}")]
    Store(#[from] StoreError),
    #[error("script tool error: {0}")]
    Script(#[from] px_adapters::ScriptError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::Parse(CommandParseError::PromptNotFound { .. }) => {
                ErrorKind::ResourceNotFound
            }
            EngineError::Parse(_) => ErrorKind::Parsing,
            EngineError::Arguments(_) => ErrorKind::ArgumentValidation,
            EngineError::ResourceNotFound { .. } | EngineError::SessionNotFound(_) => {
                ErrorKind::ResourceNotFound
            }
            EngineError::Cancelled => ErrorKind::Cancelled,
            EngineError::Template(TemplateError::UnknownRef { .. }) => ErrorKind::ResourceNotFound,
            EngineError::Template(_)
            | EngineError::Store(_)
            | EngineError::Script(_)
            | EngineError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Render this error as the pipeline's terminal response.
    pub fn into_response(self) -> EngineResponse {
        let kind = self.kind();
        let mut response = EngineResponse::error(self.to_string());
        response.merge_metadata("error_kind", serde_json::json!(kind));
        match &self {
            EngineError::Parse(CommandParseError::PromptNotFound { id, suggestions }) => {
                response.merge_metadata("missing_id", serde_json::json!(id));
                response.merge_metadata("suggestions", serde_json::json!(suggestions));
            }
            EngineError::ResourceNotFound {
                id, suggestions, ..
            } => {
                response.merge_metadata("missing_id", serde_json::json!(id));
                response.merge_metadata("suggestions", serde_json::json!(suggestions));
            }
            EngineError::Arguments(ArgumentError::Validation { issues }) => {
                response.merge_metadata("argument_issues", serde_json::json!(issues));
            }
            EngineError::Parse(CommandParseError::MissingCommand) => {
                response.merge_metadata(
                    "hint",
                    serde_json::json!("supply a command like >>prompt_id key=\"value\""),
                );
            }
            _ => {}
        }
        response
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
