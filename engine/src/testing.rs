//! A scripted in-process [`Provider`] double for driving the agent loop
//! in tests without a network dependency. Mirrors the role the teacher's
//! `wiremock` usage plays one layer down: the wire protocol itself is
//! out of scope here, so a plain scripted queue of responses is enough.

use std::sync::Mutex;

use forge_context::TokenCounter;
use forge_types::{ChatFut, ChatRequest, ChatResponse, Provider, ProviderError};

/// Replays a fixed queue of [`ChatResponse`]s, one per `chat` call, in
/// the order they were given. Token counting delegates to
/// [`TokenCounter`] so tests exercise realistic-ish token math instead
/// of a trivial constant.
#[derive(Debug)]
pub struct ScriptedProvider {
    responses: Mutex<Vec<ChatResponse>>,
    counter: TokenCounter,
    limit: u32,
}

impl ScriptedProvider {
    #[must_use]
    pub fn new(mut responses: Vec<ChatResponse>) -> Self {
        responses.reverse();
        Self {
            responses: Mutex::new(responses),
            counter: TokenCounter::new(),
            limit: 128_000,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

impl Provider for ScriptedProvider {
    fn chat<'a>(&'a self, _request: ChatRequest<'a>) -> ChatFut<'a> {
        Box::pin(async move {
            self.responses
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| ProviderError::Failed("ScriptedProvider ran out of scripted responses".to_string()))
        })
    }

    fn count_tokens(&self, text: &str) -> u32 {
        self.counter.count_str(text)
    }

    fn context_limit(&self) -> u32 {
        self.limit
    }
}
