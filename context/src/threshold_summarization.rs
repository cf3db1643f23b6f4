//! Threshold summarization strategy (spec.md §4.F.2).

use forge_types::HistoryEntry;

use crate::strategy::{summarize_via_provider, CompactionKind, CompactionPlan, StrategyCtx, StrategyFut, SummarizationStrategy};

const INSTRUCTION: &str =
    "Summarize the earlier part of this conversation in a few sentences, \
     preserving decisions, facts, and open threads the rest of the conversation still needs.";

/// Fires when counted tokens exceed `trigger_percent` of the limit,
/// collapsing the older half of the conversation (by token mass, not
/// message count) into one summary. Never touches the system prompt.
pub struct ThresholdSummarization {
    pub trigger_percent: u32,
}

impl ThresholdSummarization {
    #[must_use]
    pub fn new(trigger_percent: u32) -> Self {
        Self { trigger_percent }
    }
}

impl SummarizationStrategy for ThresholdSummarization {
    fn name(&self) -> &'static str {
        "threshold_summarization"
    }

    fn apply<'a>(&'a self, ctx: &'a StrategyCtx<'a>, history: &'a [HistoryEntry]) -> StrategyFut<'a> {
        Box::pin(async move {
            if history.len() < 2 {
                return Ok(None);
            }

            let total_tokens: u64 = history.iter().map(|e| u64::from(e.token_count)).sum();
            let threshold = u64::from(ctx.limit) * u64::from(self.trigger_percent) / 100;
            if total_tokens <= threshold {
                return Ok(None);
            }

            // System prompt (index 0) is never part of the split; the
            // remainder is halved by token mass.
            let rest_tokens: u64 = history[1..].iter().map(|e| u64::from(e.token_count)).sum();
            if rest_tokens == 0 {
                return Ok(None);
            }
            let half = rest_tokens / 2;

            let mut running = 0u64;
            let mut split = 1;
            for (offset, entry) in history[1..].iter().enumerate() {
                running += u64::from(entry.token_count);
                split = offset + 2; // index of the first entry in the "recent half"
                if running >= half {
                    break;
                }
            }
            split = split.min(history.len());

            if split <= 1 || split >= history.len() {
                return Ok(None);
            }

            let mut body = String::new();
            for entry in &history[1..split] {
                if !body.is_empty() {
                    body.push('\n');
                }
                body.push_str(entry.message.text());
            }

            let summary = summarize_via_provider(ctx.provider, INSTRUCTION, &body).await?;

            Ok(Some(CompactionPlan {
                start: 1,
                end: split,
                body: summary,
                replaced_count: split - 1,
                kind: CompactionKind::Summary,
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use forge_types::{ChatResponse, Message, MessageId};

    use crate::testing::ScriptedProvider;

    fn entry(id: u64, message: Message, token_count: u32) -> HistoryEntry {
        HistoryEntry { id: MessageId::new(id), message, token_count }
    }

    #[tokio::test]
    async fn does_not_fire_under_trigger_percent() {
        let history = vec![
            entry(0, Message::system("be helpful"), 10),
            entry(1, Message::user("hello"), 10),
        ];
        let provider: Arc<dyn forge_types::Provider> = Arc::new(ScriptedProvider::new(vec![]));
        let strategy = ThresholdSummarization::new(80);
        let ctx = StrategyCtx { provider: provider.as_ref(), limit: 1000 };
        assert!(strategy.apply(&ctx, &history).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fires_and_collapses_older_half_by_token_mass() {
        // limit 1000, trigger 80% => threshold 800. Later half alone
        // already exceeds 800 tokens (spec.md §8 S6).
        let history = vec![
            entry(0, Message::system("be helpful"), 10),
            entry(1, Message::user("old question one"), 100),
            entry(2, Message::assistant("old answer one", vec![]), 100),
            entry(3, Message::user("old question two"), 100),
            entry(4, Message::assistant("old answer two", vec![]), 550),
            entry(5, Message::user("most recent question"), 60),
        ];
        let provider: Arc<dyn forge_types::Provider> = Arc::new(ScriptedProvider::new(vec![ChatResponse {
            text: "earlier questions were about X and Y".into(),
            tool_calls: vec![],
        }]));
        let strategy = ThresholdSummarization::new(80);
        let ctx = StrategyCtx { provider: provider.as_ref(), limit: 1000 };
        let plan = strategy.apply(&ctx, &history).await.unwrap().unwrap();
        assert_eq!(plan.start, 1);
        assert!(plan.end < history.len(), "most recent message must survive verbatim");
        assert_eq!(plan.body, "earlier questions were about X and Y");
    }
}
