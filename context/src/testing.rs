//! A scripted in-process [`Provider`] double for this crate's own unit
//! tests. `forge-context` cannot depend on `forge-engine` (the dependency
//! runs the other way), so this is a crate-local twin of the shape
//! `forge_engine::testing::ScriptedProvider` provides for agent-loop tests
//! — not re-exported outside `#[cfg(test)]`.

use std::sync::Mutex;

use forge_types::{ChatFut, ChatRequest, ChatResponse, Provider, ProviderError};

#[derive(Debug)]
pub struct ScriptedProvider {
    responses: Mutex<Vec<ChatResponse>>,
}

impl ScriptedProvider {
    #[must_use]
    pub fn new(responses: Vec<ChatResponse>) -> Self {
        Self { responses: Mutex::new(responses) }
    }
}

impl Provider for ScriptedProvider {
    fn chat<'a>(&'a self, _request: ChatRequest<'a>) -> ChatFut<'a> {
        let next = self.responses.lock().unwrap().pop();
        Box::pin(async move { next.ok_or(ProviderError::Failed("script exhausted".to_string())) })
    }

    fn count_tokens(&self, text: &str) -> u32 {
        u32::try_from(text.len()).unwrap_or(u32::MAX)
    }

    fn context_limit(&self) -> u32 {
        10_000
    }
}
