//! The `Provider` contract (spec.md §1 "Out of scope": "The LLM wire
//! protocol (treated as an opaque 'provider' that chats and counts
//! tokens)").
//!
//! This crate never implements a concrete provider. It only defines the
//! boundary the agent loop and context manager call through, mirroring
//! how the teacher's `forge-providers` crate is consumed by
//! `forge-context`/`forge-engine` as a trait object, without pulling
//! its HTTP/SSE internals into scope here.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde_json::Value;

use crate::message::{Message, ToolCall};

/// A tool definition advertised to the provider for a single turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub schema: Value,
}

/// A request to advance the conversation by one provider turn.
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub messages: &'a [Message],
    pub tools: &'a [ToolDefinition],
}

/// The provider's reply: either final text (ends the turn) or requested
/// tool calls (spec.md §4.G).
#[derive(Debug, Clone, Default)]
pub struct ChatResponse {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
}

impl ChatResponse {
    #[must_use]
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Provider-layer failure (spec.md §7 "provider failure").
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider request canceled")]
    Canceled,
    #[error("provider request failed: {0}")]
    Failed(String),
}

pub type ChatFut<'a> = Pin<Box<dyn Future<Output = Result<ChatResponse, ProviderError>> + Send + 'a>>;

/// Opaque chat provider: advances a conversation and counts tokens for a
/// model-specific budget. Implementations own retries/backoff
/// internally (spec.md §7 "retried with backoff at the provider layer").
pub trait Provider: Send + Sync + fmt::Debug {
    fn chat<'a>(&'a self, request: ChatRequest<'a>) -> ChatFut<'a>;

    /// Approximate or exact token count for a piece of text under this
    /// provider's tokenizer. May be a cheap heuristic (spec.md §4.F
    /// "Token counting may be approximate").
    fn count_tokens(&self, text: &str) -> u32;

    /// The provider's context window limit in tokens.
    fn context_limit(&self) -> u32;
}
