//! Notes/Scratchpad store (spec.md §4.I).
//!
//! A concurrency-safe mapping from monotonic id to `{body, tags,
//! created_at}`. `scratch` notes are ordinary notes with a flag that
//! makes them invisible to nothing during the turn but guarantees
//! they're gone by the next one — cleared wholesale at `TurnEnd`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use forge_types::{NoteId, NoteIdGenerator};

#[derive(Debug, Clone)]
pub struct Note {
    pub id: NoteId,
    pub body: String,
    pub tags: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
    pub scratch: bool,
}

struct Inner {
    notes: HashMap<NoteId, Note>,
    order: Vec<NoteId>,
}

/// Tagged in-memory note store used by notes tools (spec.md §4.I).
pub struct NoteStore {
    ids: NoteIdGenerator,
    inner: Mutex<Inner>,
}

impl Default for NoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: NoteIdGenerator::new(),
            inner: Mutex::new(Inner {
                notes: HashMap::new(),
                order: Vec::new(),
            }),
        }
    }

    pub fn add(&self, body: impl Into<String>, tags: impl IntoIterator<Item = String>) -> NoteId {
        self.insert(body, tags, false)
    }

    /// A note that lives only until the current turn ends.
    pub fn scratch(&self, body: impl Into<String>, tags: impl IntoIterator<Item = String>) -> NoteId {
        self.insert(body, tags, true)
    }

    fn insert(&self, body: impl Into<String>, tags: impl IntoIterator<Item = String>, scratch: bool) -> NoteId {
        let id = self.ids.next();
        let note = Note {
            id,
            body: body.into(),
            tags: tags.into_iter().collect(),
            created_at: Utc::now(),
            scratch,
        };
        let mut inner = self.inner.lock().unwrap();
        inner.notes.insert(id, note);
        inner.order.push(id);
        id
    }

    /// All notes in stable insertion order. Empty if there are none.
    #[must_use]
    pub fn list(&self) -> Vec<Note> {
        let inner = self.inner.lock().unwrap();
        inner.order.iter().filter_map(|id| inner.notes.get(id).cloned()).collect()
    }

    #[must_use]
    pub fn get(&self, id: NoteId) -> Option<Note> {
        self.inner.lock().unwrap().notes.get(&id).cloned()
    }

    /// Case-insensitive substring search over note bodies, in insertion order.
    #[must_use]
    pub fn search(&self, substring: &str) -> Vec<Note> {
        let needle = substring.to_lowercase();
        self.list().into_iter().filter(|n| n.body.to_lowercase().contains(&needle)).collect()
    }

    /// The union of every note's tag set.
    #[must_use]
    pub fn list_tags(&self) -> BTreeSet<String> {
        let inner = self.inner.lock().unwrap();
        inner.notes.values().flat_map(|n| n.tags.iter().cloned()).collect()
    }

    /// Replace a note's body and tags atomically under the same id.
    /// Returns `false` if no such note exists.
    pub fn update(&self, id: NoteId, body: impl Into<String>, tags: impl IntoIterator<Item = String>) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let Some(note) = inner.notes.get_mut(&id) else {
            return false;
        };
        note.body = body.into();
        note.tags = tags.into_iter().collect();
        true
    }

    /// Drop every scratch note. Called by the agent loop at `TurnEnd`.
    pub fn clear_scratch(&self) {
        let mut inner = self.inner.lock().unwrap();
        let stale: Vec<NoteId> = inner.notes.values().filter(|n| n.scratch).map(|n| n.id).collect();
        for id in &stale {
            inner.notes.remove(id);
        }
        inner.order.retain(|id| !stale.contains(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn list_preserves_insertion_order() {
        let store = NoteStore::new();
        let a = store.add("first", tags(&[]));
        let b = store.add("second", tags(&[]));
        let ids: Vec<_> = store.list().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn search_is_case_insensitive_and_empty_when_no_match() {
        let store = NoteStore::new();
        store.add("The quick Brown Fox", tags(&[]));
        assert_eq!(store.search("brown").len(), 1);
        assert!(store.search("giraffe").is_empty());
    }

    #[test]
    fn list_tags_is_the_union_of_every_note() {
        let store = NoteStore::new();
        store.add("a", tags(&["x", "y"]));
        store.add("b", tags(&["y", "z"]));
        assert_eq!(store.list_tags(), ["x", "y", "z"].into_iter().map(String::from).collect());
    }

    #[test]
    fn update_replaces_body_and_tags_atomically() {
        let store = NoteStore::new();
        let id = store.add("old body", tags(&["old"]));
        assert!(store.update(id, "new body", tags(&["new"])));
        let note = store.get(id).unwrap();
        assert_eq!(note.body, "new body");
        assert_eq!(note.tags, tags(&["new"]).into_iter().collect());
    }

    #[test]
    fn update_of_missing_id_reports_failure_not_a_panic() {
        let store = NoteStore::new();
        assert!(!store.update(NoteIdGenerator::new().next(), "x", tags(&[])));
    }

    #[test]
    fn clear_scratch_drops_only_scratch_notes() {
        let store = NoteStore::new();
        let kept = store.add("permanent", tags(&[]));
        store.scratch("ephemeral", tags(&[]));
        store.clear_scratch();
        let ids: Vec<_> = store.list().into_iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![kept]);
    }
}
