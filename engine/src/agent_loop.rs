//! Agent Loop (spec.md §4.G): drives provider <-> tool turn cycles,
//! registers tools, emits lifecycle events.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use forge_context::ContextManager;
use forge_core::Workspace;
use forge_tools::{CancelToken, CommandRegistry, CustomToolRegistry, ToolCtx, ToolRegistry};
use forge_types::{AgentEvent, ChatRequest, Provider, ToolCall, ToolDefinition, ToolResult};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::error::AgentError;
use crate::event_stream::EventStream;
use crate::notes::NoteStore;

/// Tool names suppressed for the current mode (spec.md §4.G: "Disabled
/// tools (configured per mode ...) are absent from the provider's
/// advertised schema and rejected if the provider nevertheless calls
/// them"). Membership, not identity — callers build this from whatever
/// policy decides interactive-vs-headless tool availability.
pub type DisabledTools = HashSet<String>;

/// Drives one conversation's turn cycle against a [`ContextManager`] and
/// a [`ToolRegistry`], fanning lifecycle events out over an [`EventStream`].
pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    tool_definitions: Vec<ToolDefinition>,
    disabled_tools: DisabledTools,
    workspace: Arc<Workspace>,
    commands: Arc<CommandRegistry>,
    custom_tools: Arc<CustomToolRegistry>,
    notes: Arc<NoteStore>,
    events: broadcast::Sender<AgentEvent>,
}

impl AgentLoop {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        disabled_tools: DisabledTools,
        workspace: Arc<Workspace>,
        commands: Arc<CommandRegistry>,
        custom_tools: Arc<CustomToolRegistry>,
        notes: Arc<NoteStore>,
        events: &EventStream,
    ) -> Self {
        let tool_definitions = tools
            .iter()
            .filter(|t| !disabled_tools.contains(t.name()))
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                schema: t.schema(),
            })
            .collect();

        Self {
            provider,
            tools,
            tool_definitions,
            disabled_tools,
            workspace,
            commands,
            custom_tools,
            notes,
            events: events.sender(),
        }
    }

    #[must_use]
    pub fn advertised_tools(&self) -> &[ToolDefinition] {
        &self.tool_definitions
    }

    fn emit(&self, event: AgentEvent) {
        let _ = self.events.send(event);
    }

    /// Run one complete turn: append the user message, cycle
    /// context-strategies/provider/tool-dispatch until the assistant
    /// stops requesting tools or a loop-breaking tool succeeds, then
    /// clear scratch notes.
    pub async fn run_turn(
        &self,
        context: &mut ContextManager,
        user_message: impl Into<String>,
        cancel: &CancelToken,
    ) -> Result<(), AgentError> {
        context.append_user(user_message);
        self.emit(AgentEvent::TurnStart);
        self.custom_tools.refresh();

        let outcome = self.drive(context, cancel).await;

        self.notes.clear_scratch();
        self.emit(AgentEvent::TurnEnd);
        outcome
    }

    async fn drive(&self, context: &mut ContextManager, cancel: &CancelToken) -> Result<(), AgentError> {
        loop {
            if cancel.is_canceled() {
                return Err(AgentError::Canceled);
            }

            let tokens_before = context.counted_tokens();
            if let Some(strategy) = context.run_strategies().await {
                let tokens_after = context.counted_tokens();
                self.emit(AgentEvent::Summary { strategy, tokens_before, tokens_after });
            }

            let messages = context.messages();
            let request = ChatRequest { messages: &messages, tools: &self.tool_definitions };

            let response = tokio::select! {
                biased;
                () = cancel.canceled() => return Err(AgentError::Canceled),
                result = self.provider.chat(request) => result?,
            };

            context.append_assistant(response.text.clone(), response.tool_calls.clone());

            if response.tool_calls.is_empty() {
                return Ok(());
            }

            let mut loop_breaking_fired = false;
            let mut turn_canceled = false;

            for call in &response.tool_calls {
                if turn_canceled || cancel.is_canceled() {
                    turn_canceled = true;
                    self.record_tool_result(context, call, false, "canceled".to_string(), HashMap::new());
                    continue;
                }

                self.emit(AgentEvent::ToolCallStart {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    args: call.raw_args.clone(),
                });

                let (success, text, metadata, is_loop_breaking) = self.dispatch(call, cancel).await;
                self.record_tool_result(context, call, success, text, metadata);

                if success && is_loop_breaking {
                    loop_breaking_fired = true;
                }
            }

            if turn_canceled {
                return Err(AgentError::Canceled);
            }
            if loop_breaking_fired {
                return Ok(());
            }
            // Otherwise repeat from context strategies (spec.md §4.G).
        }
    }

    fn record_tool_result(
        &self,
        context: &mut ContextManager,
        call: &ToolCall,
        success: bool,
        text: String,
        metadata: HashMap<String, Value>,
    ) {
        context.append_tool_result(ToolResult {
            id: call.id.clone(),
            text: text.clone(),
            metadata: metadata.clone(),
            success,
        });
        self.emit(AgentEvent::ToolCallEnd { id: call.id.clone(), success, text, metadata });
    }

    async fn dispatch(
        &self,
        call: &ToolCall,
        cancel: &CancelToken,
    ) -> (bool, String, HashMap<String, Value>, bool) {
        let Some(tool) = self.tools.get(&call.name) else {
            return (false, format!("unknown tool: {}", call.name), HashMap::new(), false);
        };
        if self.disabled_tools.contains(tool.name()) {
            return (
                false,
                format!("tool `{}` is disabled in this mode", tool.name()),
                HashMap::new(),
                false,
            );
        }

        match forge_tools::decode_xml_args(&call.raw_args) {
            // An `<arguments/>` tag with no children decodes to an empty
            // string rather than an object; treat that as "no arguments"
            // for schema-validation purposes.
            Ok((Value::String(s), _)) if s.is_empty() => {}
            Ok((args, _)) => {
                if let Err(err) = forge_tools::validate_args(&tool.schema(), &args) {
                    return (false, err.to_string(), HashMap::new(), false);
                }
            }
            Err(err) => return (false, err.to_string(), HashMap::new(), false),
        }

        let ctx = ToolCtx {
            workspace: self.workspace.clone(),
            commands: self.commands.clone(),
            custom_tools: self.custom_tools.clone(),
            events: self.events.clone(),
            cancel: cancel.clone(),
            tool_call_id: call.id.clone(),
        };

        match tool.execute(&ctx, &call.raw_args).await {
            Ok(outcome) => (true, outcome.text, outcome.metadata, tool.is_loop_breaking()),
            Err(err) => (false, err.to_string(), HashMap::new(), false),
        }
    }
}
