//! Provider wiring.
//!
//! The wire protocol a real LLM endpoint speaks is out of scope for
//! this build (spec.md §1): `Provider` is deliberately opaque, and no
//! HTTP client lives anywhere in this workspace. `ProviderConfig` still
//! carries the `api_key`/`base_url`/`model` values the CLI surface
//! requires (spec.md §6) so a real network-backed `Provider` has
//! everything it needs to be dropped in at `build_provider`; until one
//! is, this binary drives the full pipeline — workspace guard, tool
//! registry, context manager, agent loop, event stream — against a
//! scripted stand-in so the rest of the system is exercised end to end.

use std::sync::Arc;

use forge_engine::testing::ScriptedProvider;
use forge_types::{ChatResponse, Provider};

#[derive(Debug, Clone, Default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
}

/// The context-window ceiling assumed when no real provider reports one.
pub const DEFAULT_CONTEXT_LIMIT: u32 = 128_000;

#[must_use]
pub fn build_provider(_config: &ProviderConfig, task: &str) -> Arc<dyn Provider> {
    let acknowledgement = ChatResponse {
        text: format!("Acknowledged task: {task}"),
        tool_calls: Vec::new(),
    };
    Arc::new(ScriptedProvider::new(vec![acknowledgement]).with_limit(DEFAULT_CONTEXT_LIMIT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn built_provider_replays_the_acknowledgement() {
        let provider = build_provider(&ProviderConfig::default(), "fix the build");
        assert!(provider.context_limit() > 0);
        let response = provider
            .chat(forge_types::ChatRequest { messages: &[], tools: &[] })
            .await
            .unwrap();
        assert_eq!(response.text, "Acknowledged task: fix the build");
    }
}
