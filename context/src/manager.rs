//! Conversation buffer owner (spec.md §4.F).

use std::sync::Arc;

use forge_types::{HistoryEntry, Message, MessageId, Provider, ToolCall, ToolResult};

use crate::strategy::{CompactionKind, CompactionPlan, StrategyCtx, SummarizationStrategy};

/// Owns the conversation, the provider reference, the token limit, and the
/// ordered strategy list.
///
/// `run_strategies` applies at most one strategy per call — the first
/// applicable one in registration order — per the pinned Open Question in
/// spec.md §9: "the earliest-listed wins this round and the loop
/// reconsiders on the next call."
pub struct ContextManager {
    provider: Arc<dyn Provider>,
    limit: u32,
    history: Vec<HistoryEntry>,
    strategies: Vec<Box<dyn SummarizationStrategy>>,
    next_id: u64,
}

impl ContextManager {
    #[must_use]
    pub fn new(provider: Arc<dyn Provider>, limit: u32, system_prompt: impl Into<String>) -> Self {
        let mut manager = Self {
            provider,
            limit,
            history: Vec::new(),
            strategies: Vec::new(),
            next_id: 1,
        };
        manager.push_raw(Message::system(system_prompt));
        manager
    }

    #[must_use]
    pub fn with_strategy(mut self, strategy: Box<dyn SummarizationStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    fn push_raw(&mut self, message: Message) -> MessageId {
        let id = MessageId::new(self.next_id);
        self.next_id += 1;
        let token_count = self.provider.count_tokens(message.text());
        self.history.push(HistoryEntry { id, message, token_count });
        id
    }

    pub fn append_user(&mut self, body: impl Into<String>) -> MessageId {
        self.push_raw(Message::user(body))
    }

    pub fn append_assistant(&mut self, body: impl Into<String>, tool_calls: Vec<ToolCall>) -> MessageId {
        self.push_raw(Message::assistant(body, tool_calls))
    }

    pub fn append_tool_result(&mut self, result: ToolResult) -> MessageId {
        self.push_raw(Message::tool_result(result))
    }

    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.history.iter().map(|e| e.message.clone()).collect()
    }

    #[must_use]
    pub fn counted_tokens(&self) -> u32 {
        self.history.iter().map(|e| e.token_count).sum()
    }

    #[must_use]
    pub fn limit(&self) -> u32 {
        self.limit
    }

    #[must_use]
    pub fn system_prompt(&self) -> &str {
        self.history[0].message.text()
    }

    /// Consults strategies in registration order and applies the first one
    /// that fires, returning its name. Strategy failures are logged and
    /// skipped — never propagated (spec.md §7: "Strategy failures during
    /// context management log and skip the strategy, never abort the
    /// turn").
    pub async fn run_strategies(&mut self) -> Option<&'static str> {
        let ctx = StrategyCtx { provider: self.provider.as_ref(), limit: self.limit };
        for index in 0..self.strategies.len() {
            let outcome = {
                let strategy = &self.strategies[index];
                strategy.apply(&ctx, &self.history).await
            };
            match outcome {
                Ok(Some(plan)) => {
                    let name = self.strategies[index].name();
                    self.apply_plan(plan);
                    return Some(name);
                }
                Ok(None) => continue,
                Err(err) => {
                    let name = self.strategies[index].name();
                    tracing::warn!(strategy = name, error = %err, "summarization strategy failed, skipping");
                    continue;
                }
            }
        }
        None
    }

    fn apply_plan(&mut self, plan: CompactionPlan) {
        debug_assert!(plan.start >= 1, "system prompt must never be collapsed");
        debug_assert!(plan.end <= self.history.len());
        debug_assert!(plan.start < plan.end);

        let token_count = self.provider.count_tokens(&plan.body);
        let message = match plan.kind {
            CompactionKind::Summary => Message::Summary { body: plan.body, replaced_count: plan.replaced_count },
            CompactionKind::GoalBatch => Message::GoalBatch { body: plan.body, replaced_count: plan.replaced_count },
        };
        let id = MessageId::new(self.next_id);
        self.next_id += 1;
        let entry = HistoryEntry { id, message, token_count };
        self.history.splice(plan.start..plan.end, std::iter::once(entry));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_types::ChatResponse;

    use crate::testing::ScriptedProvider;
    use crate::threshold_summarization::ThresholdSummarization;

    #[tokio::test]
    async fn appending_preserves_order_and_counts_tokens() {
        let provider: Arc<dyn Provider> = Arc::new(ScriptedProvider::new(vec![]));
        let mut manager = ContextManager::new(provider, 1000, "be helpful");
        manager.append_user("hello");
        manager.append_assistant("hi there", vec![]);
        assert_eq!(manager.history().len(), 3);
        assert!(manager.counted_tokens() > 0);
        assert_eq!(manager.system_prompt(), "be helpful");
    }

    #[tokio::test]
    async fn threshold_strategy_fires_through_the_manager_and_keeps_system_prompt_bit_for_bit() {
        // spec.md §8 S6: limit 1000, later half already exceeds 800
        // tokens; appending another user message fires the threshold
        // strategy.
        let provider: Arc<dyn Provider> = Arc::new(ScriptedProvider::new(vec![ChatResponse {
            text: "earlier turns covered background questions".into(),
            tool_calls: vec![],
        }]));
        let mut manager = ContextManager::new(provider, 1000, "be a helpful coding assistant")
            .with_strategy(Box::new(ThresholdSummarization::new(80)));

        for _ in 0..3 {
            manager.append_user("a".repeat(300));
        }
        manager.append_user("what should I do next?");

        let fired = manager.run_strategies().await;
        assert_eq!(fired, Some("threshold_summarization"));
        assert_eq!(manager.system_prompt(), "be a helpful coding assistant");
        assert!(manager.counted_tokens() < manager.limit());
        assert_eq!(manager.history().last().unwrap().message.text(), "what should I do next?");
    }

    #[tokio::test]
    async fn no_strategies_registered_never_fires() {
        let provider: Arc<dyn Provider> = Arc::new(ScriptedProvider::new(vec![]));
        let mut manager = ContextManager::new(provider, 10, "be helpful");
        manager.append_user("hi".repeat(100));
        assert_eq!(manager.run_strategies().await, None);
    }
}
