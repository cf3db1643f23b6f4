//! Context Manager: the conversation buffer and its pluggable
//! summarization strategies (spec.md §4.F).

mod error;
mod goal_batch;
mod manager;
mod strategy;
mod threshold_summarization;
mod token_counter;
mod tool_call_summarization;

#[cfg(test)]
mod testing;

pub use error::ContextError;
pub use goal_batch::GoalBatchCompaction;
pub use manager::ContextManager;
pub use strategy::{CompactionKind, CompactionPlan, StrategyCtx, StrategyFut, SummarizationStrategy};
pub use threshold_summarization::ThresholdSummarization;
pub use token_counter::TokenCounter;
pub use tool_call_summarization::ToolCallSummarization;
