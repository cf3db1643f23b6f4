//! The summarization strategy contract (spec.md §4.F, §9 "Strategy
//! composition").

use std::future::Future;
use std::pin::Pin;

use forge_types::{HistoryEntry, Provider};

use crate::error::ContextError;

/// Which kind of collapsed message a [`CompactionPlan`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactionKind {
    Summary,
    GoalBatch,
}

/// A strategy's verdict: replace `history[start..end]` with one message.
///
/// `start` is never `0` — the system prompt at index 0 is never eligible,
/// matching spec.md §8 invariant 4 ("the first message equals the original
/// system prompt").
#[derive(Debug, Clone)]
pub struct CompactionPlan {
    pub start: usize,
    pub end: usize,
    pub body: String,
    pub replaced_count: usize,
    pub kind: CompactionKind,
}

/// Read-only context a strategy needs to decide and, if it fires, to build
/// its replacement message.
pub struct StrategyCtx<'a> {
    pub provider: &'a dyn Provider,
    pub limit: u32,
}

pub type StrategyFut<'a> =
    Pin<Box<dyn Future<Output = Result<Option<CompactionPlan>, ContextError>> + Send + 'a>>;

/// One pluggable rewrite rule over the conversation buffer.
///
/// Implementations are total functions over `history`: given the same
/// buffer and context, they must be deterministic about whether they fire.
/// Strategies may call `ctx.provider.chat` to produce the replacement
/// message's body; [`ContextManager::run_strategies`](crate::ContextManager::run_strategies)
/// fires at most one strategy per call (spec.md §9).
pub trait SummarizationStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply<'a>(&'a self, ctx: &'a StrategyCtx<'a>, history: &'a [HistoryEntry]) -> StrategyFut<'a>;
}

/// Ask the provider to produce a summary of `body` under `instruction`, as
/// a one-shot exchange outside the live conversation.
pub(crate) async fn summarize_via_provider(
    provider: &dyn Provider,
    instruction: &str,
    body: &str,
) -> Result<String, ContextError> {
    use forge_types::{ChatRequest, Message};

    let synthetic = [Message::system(instruction), Message::user(body)];
    let response = provider
        .chat(ChatRequest {
            messages: &synthetic,
            tools: &[],
        })
        .await?;
    Ok(response.text)
}
