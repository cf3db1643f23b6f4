//! Line-change accounting for `write_file`/`apply_diff` metadata
//! (spec.md §4.D: "Line-change counts compare the full old and new line
//! arrays").

use similar::{ChangeTag, TextDiff};

/// Normalize CRLF to LF before line-change accounting (spec.md §6
/// "Writes: ... normalizing CRLF→LF during line-change accounting").
#[must_use]
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Count of lines added and removed between two full file bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineChangeCounts {
    pub added: usize,
    pub removed: usize,
}

/// Compare the complete old and new contents of a file and report how
/// many lines were added/removed, so an overwrite of a 3-line file with
/// a 5-line body reports `+5/-3` (spec.md §4.D `write_file`).
#[must_use]
pub fn line_change_counts(old: &str, new: &str) -> LineChangeCounts {
    let old = normalize_newlines(old);
    let new = normalize_newlines(new);
    let diff = TextDiff::from_lines(&old, &new);

    let mut counts = LineChangeCounts::default();
    for change in diff.iter_all_changes() {
        match change.tag() {
            ChangeTag::Insert => counts.added += 1,
            ChangeTag::Delete => counts.removed += 1,
            ChangeTag::Equal => {}
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_reports_full_add_and_remove_counts() {
        let old = "a\nb\nc\n";
        let new = "1\n2\n3\n4\n5\n";
        let counts = line_change_counts(old, new);
        assert_eq!(counts.added, 5);
        assert_eq!(counts.removed, 3);
    }

    #[test]
    fn identical_content_has_no_changes() {
        let counts = line_change_counts("same\n", "same\n");
        assert_eq!(counts, LineChangeCounts::default());
    }

    #[test]
    fn crlf_is_normalized_before_diffing() {
        let counts = line_change_counts("a\r\nb\r\n", "a\nb\n");
        assert_eq!(counts, LineChangeCounts::default());
    }
}
