//! An approximate, tiktoken-backed token counter (spec.md §4.F: "Token
//! counting may be approximate (character-based or a provider-supplied
//! counter)").
//!
//! [`ContextManager`](crate::ContextManager) itself never counts tokens
//! directly — it always goes through the configured `Provider`. This type
//! exists for concrete `Provider` implementations (and tests) that want a
//! reasonable default rather than hand-rolling one, the same role the
//! teacher's own `TokenCounter` plays for its providers.

use std::sync::OnceLock;

use forge_types::Message;
use tiktoken_rs::CoreBPE;

static ENCODER: OnceLock<Option<CoreBPE>> = OnceLock::new();

fn encoder() -> Option<&'static CoreBPE> {
    ENCODER.get_or_init(|| tiktoken_rs::o200k_base().ok()).as_ref()
}

/// Role overhead approximating per-message structural tokens (role marker,
/// delimiters) that a raw content encoding misses.
const MESSAGE_OVERHEAD: u32 = 4;

/// Character-count fallback used when the `o200k_base` encoding can't be
/// loaded (offline builds, missing vocab file).
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCounter;

impl TokenCounter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn count_str(&self, text: &str) -> u32 {
        let len = match encoder() {
            Some(enc) => enc.encode_ordinary(text).len(),
            None => text.len(),
        };
        u32::try_from(len).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn count_message(&self, message: &Message) -> u32 {
        self.count_str(message.text()) + MESSAGE_OVERHEAD
    }

    #[must_use]
    pub fn count_messages(&self, messages: &[Message]) -> u32 {
        messages.iter().map(|m| self.count_message(m)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_nonzero_tokens_for_nonempty_text() {
        let counter = TokenCounter::new();
        assert!(counter.count_str("hello, world!") > 0);
    }

    #[test]
    fn empty_string_counts_to_zero() {
        let counter = TokenCounter::new();
        assert_eq!(counter.count_str(""), 0);
    }

    #[test]
    fn message_count_includes_overhead() {
        let counter = TokenCounter::new();
        let msg = Message::user("hi");
        assert!(counter.count_message(&msg) >= MESSAGE_OVERHEAD);
    }
}
