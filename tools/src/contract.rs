//! Tool contract (spec.md §4.C "Tool Contract").
//!
//! Every tool is a [`ToolExecutor`]: a name, a JSON-schema-shaped
//! argument description, an async `execute` that takes the raw
//! `<arguments>` XML a provider emitted, and a flag for whether a
//! successful call should end the agent's turn immediately
//! (`is_loop_breaking`, spec.md §4.G "loop-breaking tools"). Tools that
//! can usefully describe what they're about to do before running can
//! also implement `generate_preview`.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use forge_core::Workspace;
use forge_types::AgentEvent;
use serde_json::Value;
use tokio::sync::broadcast;

use crate::cancel::CancelToken;
use crate::command_registry::CommandRegistry;
use crate::custom::CustomToolRegistry;
use crate::error::ToolError;

/// A tool call's successful result: the text that goes back to the
/// provider as the `tool_result` body, plus structured metadata a
/// caller (the event stream, a UI) can use without re-parsing text.
#[derive(Debug, Clone, Default)]
pub struct ToolOutcome {
    pub text: String,
    pub metadata: HashMap<String, Value>,
}

impl ToolOutcome {
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A human-facing description of what a tool call would do, generated
/// without side effects (spec.md §4.C "preview before approval").
#[derive(Debug, Clone, Default)]
pub struct Preview {
    pub kind: String,
    pub title: String,
    pub description: String,
    pub content: String,
    pub metadata: HashMap<String, Value>,
}

/// Per-call context threaded into every tool invocation: the workspace
/// boundary, the shared command registry for cancellable subprocesses,
/// an event sink, and the cancellation signal for this turn.
#[derive(Clone)]
pub struct ToolCtx {
    pub workspace: Arc<Workspace>,
    pub commands: Arc<CommandRegistry>,
    pub custom_tools: Arc<CustomToolRegistry>,
    pub events: broadcast::Sender<AgentEvent>,
    pub cancel: CancelToken,
    pub tool_call_id: String,
}

impl ToolCtx {
    pub fn emit(&self, event: AgentEvent) {
        // `send` only errors when there are no subscribers; that's not a
        // tool failure, just no one listening.
        let _ = self.events.send(event);
    }
}

pub type ToolFut<'a> = Pin<Box<dyn Future<Output = Result<ToolOutcome, ToolError>> + Send + 'a>>;
pub type PreviewFut<'a> = Pin<Box<dyn Future<Output = Result<Preview, ToolError>> + Send + 'a>>;

pub trait ToolExecutor: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// JSON-schema-shaped description of the tool's arguments, used
    /// both to advertise the tool to a provider and (via `jsonschema`)
    /// to validate decoded arguments before dispatch.
    fn schema(&self) -> Value;

    /// Whether a successful call should end the current turn rather
    /// than loop back to the provider (spec.md §4.G).
    fn is_loop_breaking(&self) -> bool {
        false
    }

    fn execute<'a>(&'a self, ctx: &'a ToolCtx, args_xml: &'a str) -> ToolFut<'a>;

    /// Optional dry-run description of the call's effect. Tools that
    /// don't implement this have no preview.
    fn generate_preview<'a>(&'a self, _ctx: &'a ToolCtx, _args_xml: &'a str) -> Option<PreviewFut<'a>> {
        None
    }
}

/// Ordered, name-indexed collection of tools (spec.md §4.C "registered
/// in a fixed order; duplicate names are rejected at registration").
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn ToolExecutor>>,
    by_name: HashMap<&'static str, usize>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Arc<dyn ToolExecutor>) -> Result<(), ToolError> {
        let name = tool.name();
        if self.by_name.contains_key(name) {
            return Err(ToolError::DuplicateTool(name.to_string()));
        }
        self.by_name.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolExecutor>> {
        self.by_name.get(name).map(|&idx| &self.tools[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn ToolExecutor>> {
        self.tools.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
