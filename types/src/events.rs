//! Event Stream payloads (spec.md §4.H).
//!
//! Defined here, rather than in `forge-engine`, because both
//! `forge-tools` (command execution) and `forge-context` (summarization)
//! need to construct these variants without depending on the engine.

use std::collections::HashMap;

use serde_json::Value;

use crate::ids::ExecId;

/// Which stream a chunk of subprocess output came from (spec.md §5(c)).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// A single fan-out event (spec.md §4.H).
#[derive(Debug, Clone)]
pub enum AgentEvent {
    TurnStart,
    ToolCallStart {
        id: String,
        name: String,
        args: String,
    },
    ToolCallEnd {
        id: String,
        success: bool,
        text: String,
        metadata: HashMap<String, Value>,
    },
    CommandExecutionStart {
        exec_id: ExecId,
        command: String,
        cwd: String,
    },
    CommandOutput {
        exec_id: ExecId,
        stream: OutputStream,
        chunk: String,
    },
    CommandExecutionComplete {
        exec_id: ExecId,
        exit_code: i32,
        duration_ms: u64,
    },
    CommandExecutionFailed {
        exec_id: ExecId,
        reason: String,
        duration_ms: u64,
    },
    CommandExecutionCanceled {
        exec_id: ExecId,
        duration_ms: u64,
    },
    Summary {
        strategy: &'static str,
        tokens_before: u32,
        tokens_after: u32,
    },
    TurnEnd,
}
