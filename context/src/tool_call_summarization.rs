//! Tool-call summarization strategy (spec.md §4.F.1).

use forge_types::{HistoryEntry, Message};

use crate::error::ContextError;
use crate::strategy::{summarize_via_provider, CompactionKind, CompactionPlan, StrategyCtx, StrategyFut, SummarizationStrategy};

const INSTRUCTION: &str =
    "Summarize the following tool calls and their results in a few sentences, \
     preserving any facts the conversation will still need.";

/// Collapses old, buffered-up tool_call/tool_result pairs into one
/// `Message::Summary`, leaving surrounding user/assistant turns untouched.
pub struct ToolCallSummarization {
    /// How many messages back a tool-activity block must be before it's
    /// eligible for collapsing.
    pub min_age: usize,
    /// Minimum number of eligible blocks required to fire.
    pub min_buffer: usize,
    /// Forces firing regardless of `min_buffer` once any eligible block's
    /// age reaches this.
    pub max_age: usize,
}

impl ToolCallSummarization {
    #[must_use]
    pub fn new(min_age: usize, min_buffer: usize, max_age: usize) -> Self {
        Self { min_age, min_buffer, max_age }
    }
}

/// A contiguous `[start, end)` run of tool-call/tool_result traffic: one
/// `Assistant` entry with tool calls, followed by its `ToolResult` entries.
struct ToolBlock {
    start: usize,
    end: usize,
}

fn find_tool_blocks(history: &[HistoryEntry]) -> Vec<ToolBlock> {
    let mut blocks = Vec::new();
    let mut i = 1; // never the system prompt at index 0
    while i < history.len() {
        if !history[i].message.tool_calls().is_empty() {
            let start = i;
            let mut end = i + 1;
            while end < history.len() && matches!(history[end].message, Message::ToolResult { .. }) {
                end += 1;
            }
            blocks.push(ToolBlock { start, end });
            i = end;
        } else {
            i += 1;
        }
    }
    blocks
}

impl SummarizationStrategy for ToolCallSummarization {
    fn name(&self) -> &'static str {
        "tool_call_summarization"
    }

    fn apply<'a>(&'a self, ctx: &'a StrategyCtx<'a>, history: &'a [HistoryEntry]) -> StrategyFut<'a> {
        Box::pin(async move {
            let blocks = find_tool_blocks(history);
            let total = history.len();

            let mut eligible: Vec<&ToolBlock> = blocks
                .iter()
                .filter(|b| total.saturating_sub(b.end) >= self.min_age)
                .collect();
            eligible.sort_by_key(|b| b.start);

            if eligible.is_empty() {
                return Ok(None);
            }

            let should_fire = eligible.len() >= self.min_buffer
                || eligible.iter().any(|b| total.saturating_sub(b.end) >= self.max_age);
            if !should_fire {
                return Ok(None);
            }

            // Collapse the earliest eligible block and any immediately
            // adjacent eligible blocks that follow it with nothing in
            // between, per spec.md §9's "earliest-listed wins" rule.
            let first = eligible[0];
            let mut range_start = first.start;
            let mut range_end = first.end;
            for block in eligible.iter().skip(1) {
                if block.start == range_end {
                    range_end = block.end;
                } else {
                    break;
                }
            }
            range_start = range_start.max(1);

            let mut body = String::new();
            for entry in &history[range_start..range_end] {
                if !body.is_empty() {
                    body.push('\n');
                }
                body.push_str(entry.message.text());
            }

            let summary = summarize_via_provider(ctx.provider, INSTRUCTION, &body).await?;

            Ok(Some(CompactionPlan {
                start: range_start,
                end: range_end,
                body: summary,
                replaced_count: range_end - range_start,
                kind: CompactionKind::Summary,
            }))
        })
    }
}
