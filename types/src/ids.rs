//! Monotonic identifiers shared across the conversation, tool, and note models.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-conversation message identifier, assigned in append order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic per-process counter for subprocess exec-ids (spec.md §3, §4.E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ExecId(u64);

impl ExecId {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ExecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "exec-{}", self.0)
    }
}

/// Generator for [`ExecId`] values, unique for the lifetime of the process.
#[derive(Debug, Default)]
pub struct ExecIdGenerator(AtomicU64);

impl ExecIdGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    pub fn next(&self) -> ExecId {
        ExecId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

/// Monotonic identifier for notes (spec.md §3, §4.I).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct NoteId(u64);

impl NoteId {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "note-{}", self.0)
    }
}

/// Generator for [`NoteId`] values, unique for the lifetime of the note store.
#[derive(Debug, Default)]
pub struct NoteIdGenerator(AtomicU64);

impl NoteIdGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU64::new(1))
    }

    pub fn next(&self) -> NoteId {
        NoteId(self.0.fetch_add(1, Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exec_id_generator_is_monotonic_and_unique() {
        let gen = ExecIdGenerator::new();
        let a = gen.next();
        let b = gen.next();
        assert_ne!(a, b);
        assert!(b.value() > a.value());
    }

    #[test]
    fn note_id_generator_starts_at_one() {
        let gen = NoteIdGenerator::new();
        assert_eq!(gen.next().value(), 1);
        assert_eq!(gen.next().value(), 2);
    }
}
