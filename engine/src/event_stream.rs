//! Event Stream (spec.md §4.H): a single-writer fan-out channel of
//! [`AgentEvent`]s. The UI subscribes; a headless executor logs events at
//! a verbosity level instead.

use forge_types::AgentEvent;
use tokio::sync::broadcast;

/// Default channel capacity: generous enough that a burst of
/// `CommandOutput` lines from a chatty subprocess doesn't lag a slow
/// subscriber into `Lagged` drops during normal use.
const DEFAULT_CAPACITY: usize = 1024;

/// Owns the broadcast sender side of the event fan-out. Cloning the
/// sender (via [`EventStream::sender`]) is how [`crate::agent_loop::AgentLoop`]
/// and every per-call `ToolCtx` get write access; [`EventStream::subscribe`]
/// is how a reader joins.
#[derive(Clone)]
pub struct EventStream {
    sender: broadcast::Sender<AgentEvent>,
}

impl Default for EventStream {
    fn default() -> Self {
        Self::new()
    }
}

impl EventStream {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sender: broadcast::channel(capacity).0,
        }
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AgentEvent> {
        self.sender.subscribe()
    }

    #[must_use]
    pub fn sender(&self) -> broadcast::Sender<AgentEvent> {
        self.sender.clone()
    }

    pub fn emit(&self, event: AgentEvent) {
        let _ = self.sender.send(event);
    }
}
