//! Core conversation domain model (spec.md §3 "Conversation").
//!
//! `Message` is the sum type stored in the conversation buffer. Token
//! counts are not carried on the message itself; the context manager
//! pairs each message with its counted size when it appends to history,
//! the same split the teacher's `FullHistory` makes between message
//! content and `MessageId -> token_count` bookkeeping.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::MessageId;

/// A tool call requested by the assistant.
///
/// `raw_args` is the untouched XML fragment the provider emitted; tools
/// decode it lazily via [`crate::xml_args`] so a malformed fragment from
/// one call never prevents the rest of the turn from being inspected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub raw_args: String,
}

/// The paired outcome of a [`ToolCall`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolResult {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    pub success: bool,
}

impl ToolResult {
    #[must_use]
    pub fn ok(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: HashMap::new(),
            success: true,
        }
    }

    #[must_use]
    pub fn error(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: HashMap::new(),
            success: false,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// One entry in the conversation buffer (spec.md §3).
///
/// `Summary` and `GoalBatch` are produced by the context manager's
/// summarization strategies (spec.md §4.F); they are ordinary messages
/// from the agent loop's point of view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Message {
    System {
        body: String,
    },
    User {
        body: String,
    },
    Assistant {
        body: String,
        tool_calls: Vec<ToolCall>,
    },
    ToolResult {
        result: ToolResult,
    },
    Summary {
        body: String,
        /// Number of original messages this summary replaced, for diagnostics.
        replaced_count: usize,
    },
    GoalBatch {
        body: String,
        replaced_count: usize,
    },
}

impl Message {
    #[must_use]
    pub fn system(body: impl Into<String>) -> Self {
        Self::System { body: body.into() }
    }

    #[must_use]
    pub fn user(body: impl Into<String>) -> Self {
        Self::User { body: body.into() }
    }

    #[must_use]
    pub fn assistant(body: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self::Assistant {
            body: body.into(),
            tool_calls,
        }
    }

    #[must_use]
    pub fn tool_result(result: ToolResult) -> Self {
        Self::ToolResult { result }
    }

    /// The textual body used for token counting and summarization prompts.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::System { body }
            | Self::User { body }
            | Self::Assistant { body, .. }
            | Self::Summary { body, .. }
            | Self::GoalBatch { body, .. } => body,
            Self::ToolResult { result } => &result.text,
        }
    }

    #[must_use]
    pub fn is_system(&self) -> bool {
        matches!(self, Self::System { .. })
    }

    #[must_use]
    pub fn is_user(&self) -> bool {
        matches!(self, Self::User { .. })
    }

    #[must_use]
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Self::Assistant { tool_calls, .. } => tool_calls,
            _ => &[],
        }
    }
}

/// A message paired with the `MessageId` assigned by the history buffer.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: MessageId,
    pub message: Message,
    pub token_count: u32,
}
