//! Context-manager error kinds (spec.md §7).

use forge_types::ProviderError;

#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("summarization provider call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("system prompt is missing from history")]
    MissingSystemPrompt,
}
