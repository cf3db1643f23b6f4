//! Agent Loop error kinds (spec.md §7 "provider failure", "canceled").

use forge_types::ProviderError;

/// Failures that terminate a turn outright rather than becoming a
/// `tool_result` (spec.md §7 propagation policy: "configuration and
/// provider failures terminate the turn").
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("turn canceled")]
    Canceled,
}
