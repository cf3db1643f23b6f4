//! Tool-layer error kinds (spec.md §7).

use std::path::PathBuf;

use forge_core::GuardError;

/// Errors a tool's `execute` can return. These become `tool_result`
/// text with `success = false` in the conversation (spec.md §7 "tool
/// failure — ... surfaced as a tool_result with success=false, never
/// raised up the loop"); the agent loop never lets one propagate.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{message}")]
    BadArgs { message: String },

    #[error("path outside the workspace and not whitelisted: {0}")]
    BoundaryViolation(String),

    #[error("path is ignored: {0}")]
    Ignored(String),

    #[error("{kind} not found: {name}")]
    NotFound { kind: &'static str, name: String },

    #[error("search text appears {count} times in {file}; it must appear exactly once. {guidance}")]
    AmbiguousMatch {
        file: PathBuf,
        count: usize,
        guidance: String,
    },

    #[error("command timed out after {elapsed_ms}ms")]
    DeadlineExceeded { elapsed_ms: u64 },

    #[error("canceled")]
    Canceled,

    #[error("{tool} failed: {message}")]
    ExecutionFailed { tool: String, message: String },

    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("duplicate tool registered: {0}")]
    DuplicateTool(String),
}

impl From<GuardError> for ToolError {
    fn from(err: GuardError) -> Self {
        match err {
            GuardError::OutsideWorkspace { .. } => ToolError::BoundaryViolation(err.to_string()),
            GuardError::Ignored { .. } => ToolError::Ignored(err.to_string()),
            other => ToolError::BadArgs {
                message: other.to_string(),
            },
        }
    }
}

impl ToolError {
    /// Whether this error should surface as a failed `tool_result`
    /// (always true per spec.md §7 propagation policy for tool
    /// failures) rather than terminate the turn. Kept as a named
    /// predicate so call sites read as intent, not incidental `match`.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        true
    }
}
