//! Core domain types for Forge's core runtime: no IO, no async.
//!
//! Shared by every other crate in the workspace so the conversation
//! model, tool-call/result shapes, and event payloads have exactly one
//! definition.

pub mod events;
pub mod ids;
pub mod message;
pub mod provider;

pub use events::{AgentEvent, OutputStream};
pub use ids::{ExecId, ExecIdGenerator, MessageId, NoteId, NoteIdGenerator};
pub use message::{HistoryEntry, Message, ToolCall, ToolResult};
pub use provider::{ChatFut, ChatRequest, ChatResponse, Provider, ProviderError, ToolDefinition};
