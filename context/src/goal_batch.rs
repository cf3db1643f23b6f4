//! Goal-batch compaction strategy (spec.md §4.F.3).

use forge_types::{HistoryEntry, Message};

use crate::strategy::{CompactionKind, CompactionPlan, StrategyCtx, StrategyFut, SummarizationStrategy};

/// Compacts whole "turns" (a user message plus the assistant/tool activity
/// up to the next user message) into one `goal_batch` block. Unlike the
/// other two strategies, the digest is built mechanically from the turn's
/// own text — it doesn't need a provider call.
pub struct GoalBatchCompaction {
    /// How many turns back (from the most recent) a turn must be before
    /// it's eligible for compaction.
    pub turns_old: usize,
    /// Minimum number of eligible turns required to fire.
    pub min_turns: usize,
    /// Never compacts more than this many turns in one firing.
    pub max_turns: usize,
}

impl GoalBatchCompaction {
    #[must_use]
    pub fn new(turns_old: usize, min_turns: usize, max_turns: usize) -> Self {
        Self { turns_old, min_turns, max_turns }
    }
}

struct Turn {
    start: usize,
    end: usize,
}

fn find_turns(history: &[HistoryEntry]) -> Vec<Turn> {
    let user_indices: Vec<usize> = history
        .iter()
        .enumerate()
        .skip(1) // never the system prompt
        .filter(|(_, e)| e.message.is_user())
        .map(|(i, _)| i)
        .collect();

    user_indices
        .iter()
        .enumerate()
        .map(|(i, &start)| {
            let end = user_indices.get(i + 1).copied().unwrap_or(history.len());
            Turn { start, end }
        })
        .collect()
}

fn digest_turn(history: &[HistoryEntry], turn: &Turn) -> String {
    let goal = history[turn.start].message.text();
    let mut tool_calls = 0usize;
    let mut final_note = String::new();
    for entry in &history[turn.start + 1..turn.end] {
        match &entry.message {
            Message::Assistant { body, tool_calls: calls } => {
                tool_calls += calls.len();
                if !body.is_empty() {
                    final_note = body.clone();
                }
            }
            _ => {}
        }
    }
    if final_note.is_empty() {
        format!("goal: {goal} ({tool_calls} tool call(s), no final note)")
    } else {
        format!("goal: {goal} ({tool_calls} tool call(s)) -> {final_note}")
    }
}

impl SummarizationStrategy for GoalBatchCompaction {
    fn name(&self) -> &'static str {
        "goal_batch_compaction"
    }

    fn apply<'a>(&'a self, _ctx: &'a StrategyCtx<'a>, history: &'a [HistoryEntry]) -> StrategyFut<'a> {
        Box::pin(async move {
            let turns = find_turns(history);
            let total_turns = turns.len();

            let eligible_count = turns
                .iter()
                .enumerate()
                .take_while(|(i, _)| total_turns - 1 - i >= self.turns_old)
                .count();

            if eligible_count < self.min_turns {
                return Ok(None);
            }

            let take = eligible_count.min(self.max_turns);
            if take == 0 {
                return Ok(None);
            }

            let range_start = turns[0].start;
            let range_end = turns[take - 1].end;

            let mut body = String::new();
            for turn in &turns[..take] {
                if !body.is_empty() {
                    body.push('\n');
                }
                body.push_str(&digest_turn(history, turn));
            }

            Ok(Some(CompactionPlan {
                start: range_start,
                end: range_end,
                body,
                replaced_count: range_end - range_start,
                kind: CompactionKind::GoalBatch,
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use forge_types::MessageId;

    use crate::testing::ScriptedProvider;

    fn entry(id: u64, message: Message) -> HistoryEntry {
        HistoryEntry { id: MessageId::new(id), message, token_count: 10 }
    }

    fn history_with_turns(n: usize) -> Vec<HistoryEntry> {
        let mut history = vec![entry(0, Message::system("be helpful"))];
        let mut id = 1;
        for i in 0..n {
            history.push(entry(id, Message::user(format!("goal {i}"))));
            id += 1;
            history.push(entry(id, Message::assistant(format!("done with {i}"), vec![])));
            id += 1;
        }
        history
    }

    #[tokio::test]
    async fn does_not_fire_below_min_turns() {
        let history = history_with_turns(5);
        let provider: Arc<dyn forge_types::Provider> = Arc::new(ScriptedProvider::new(vec![]));
        let strategy = GoalBatchCompaction::new(1, 10, 10);
        let ctx = StrategyCtx { provider: provider.as_ref(), limit: 10_000 };
        assert!(strategy.apply(&ctx, &history).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn compacts_oldest_eligible_turns_up_to_max_turns() {
        let history = history_with_turns(6);
        let provider: Arc<dyn forge_types::Provider> = Arc::new(ScriptedProvider::new(vec![]));
        // 6 turns total; turns_old=1 makes all but the most recent eligible (5).
        let strategy = GoalBatchCompaction::new(1, 2, 3);
        let ctx = StrategyCtx { provider: provider.as_ref(), limit: 10_000 };
        let plan = strategy.apply(&ctx, &history).await.unwrap().unwrap();
        assert_eq!(plan.replaced_count, 6); // 3 turns * 2 entries each
        assert!(plan.body.contains("goal 0"));
        assert!(plan.body.contains("goal 2"));
        assert!(!plan.body.contains("goal 3"));
        assert_eq!(plan.kind, CompactionKind::GoalBatch);
    }
}
