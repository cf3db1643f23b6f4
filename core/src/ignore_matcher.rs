//! Ignore rule set (spec.md §3 "Ignore rule set", §4.B).
//!
//! Patterns are drawn from three layered sources, in order: built-in
//! defaults, `.gitignore`, `.forgeignore`. Evaluation walks the
//! combined list in source order; the last matching pattern wins, and a
//! negated pattern (`!prefix`) un-ignores a path a later pattern would
//! otherwise re-ignore. Unknown glob syntax is treated literally rather
//! than rejected, so a model-authored `.forgeignore` never blocks a
//! turn (spec.md §4.B "never as an error that blocks operation").

use std::path::Path;

use globset::{Glob, GlobMatcher};

/// A single compiled ignore pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    matcher: GlobMatcher,
    directory_only: bool,
    anchored: bool,
    negated: bool,
}

impl Pattern {
    /// Parse one `.gitignore`-style line. Returns `None` for blank lines
    /// and comments.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let line = raw.trim_end();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }

        let mut rest = line;
        let negated = if let Some(stripped) = rest.strip_prefix('!') {
            rest = stripped;
            true
        } else {
            false
        };

        let directory_only = rest.ends_with('/');
        let body = rest.trim_end_matches('/');
        let anchored = body.starts_with('/');
        let body = body.trim_start_matches('/');
        if body.is_empty() {
            return None;
        }

        // Unanchored patterns match at any depth; anchor a `**/` prefix
        // unless the author already used a glob separator, mirroring how
        // git itself treats a bare `foo` pattern as `**/foo`.
        let glob_text = if anchored || body.contains('/') {
            body.to_string()
        } else {
            format!("**/{body}")
        };

        let glob = match Glob::new(&glob_text) {
            Ok(g) => g,
            // Unknown/unparseable syntax: fall back to a literal match on
            // the raw body so malformed input never becomes a hard error.
            Err(_) => Glob::new(&glob::escape_for_literal(&glob_text)).ok()?,
        };

        Some(Self {
            source: raw.to_string(),
            matcher: glob.compile_matcher(),
            directory_only,
            anchored,
            negated,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn is_directory_only(&self) -> bool {
        self.directory_only
    }

    fn matches(&self, relative: &Path, is_dir: bool) -> bool {
        if self.directory_only && !is_dir {
            return false;
        }
        self.matcher.is_match(relative)
    }
}

/// Literal-glob escaping helper for patterns globset can't parse.
mod glob {
    pub fn escape_for_literal(s: &str) -> String {
        let mut out = String::with_capacity(s.len() * 2);
        for c in s.chars() {
            if "*?[]{}".contains(c) {
                out.push('\\');
            }
            out.push(c);
        }
        out
    }
}

/// Built-in default ignore patterns, layered beneath `.gitignore` and
/// `.forgeignore` (spec.md §3). Extended per SPEC_FULL.md's supplemented
/// "denied-pattern filesystem policy" with the teacher's secret/credential
/// deny list, so a misconfigured `.gitignore` is never the only thing
/// standing between a tool call and an SSH key.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    ".git/",
    "node_modules/",
    "target/",
    ".forge/",
    "*.tmp",
    ".ssh/",
    ".gnupg/",
    ".aws/",
    ".env",
    ".env.*",
    "*.pem",
    "*.key",
    "id_rsa*",
    "id_ed25519*",
    "*.p12",
    "*.pfx",
    "*.dmp",
    "*.core",
];

/// Layered, ordered ignore rule evaluator.
#[derive(Debug, Clone, Default)]
pub struct IgnoreMatcher {
    patterns: Vec<Pattern>,
}

impl IgnoreMatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the three layered sources in order: defaults,
    /// `.gitignore` contents, `.forgeignore` contents.
    #[must_use]
    pub fn from_sources(gitignore: Option<&str>, forgeignore: Option<&str>) -> Self {
        let mut matcher = Self::new();
        for raw in DEFAULT_IGNORE_PATTERNS {
            matcher.add_line(raw);
        }
        if let Some(text) = gitignore {
            for line in text.lines() {
                matcher.add_line(line);
            }
        }
        if let Some(text) = forgeignore {
            for line in text.lines() {
                matcher.add_line(line);
            }
        }
        matcher
    }

    pub fn add_line(&mut self, raw: &str) {
        if let Some(pattern) = Pattern::parse(raw) {
            self.patterns.push(pattern);
        }
    }

    /// Decide whether `relative` (already relative to the workspace
    /// root, forward-slash form expected by callers) is ignored.
    ///
    /// Evaluates every pattern in source order; the last match wins and
    /// a negated match un-ignores regardless of earlier matches.
    #[must_use]
    pub fn is_ignored(&self, relative: &Path, is_dir: bool) -> bool {
        let mut ignored = false;
        for pattern in &self.patterns {
            if pattern.matches(relative, is_dir) {
                ignored = !pattern.negated;
            }
        }
        ignored
    }

    /// Whether `relative` is a directory matched by a directory-only
    /// pattern, meaning a recursive walk should prune it entirely rather
    /// than merely skip listing it (spec.md §3 "prune the walk").
    #[must_use]
    pub fn should_prune_dir(&self, relative: &Path) -> bool {
        self.is_ignored(relative, true)
    }

    #[must_use]
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unanchored_pattern_matches_any_depth() {
        let m = IgnoreMatcher::from_sources(Some("secret.env"), None);
        assert!(m.is_ignored(Path::new("secret.env"), false));
        assert!(m.is_ignored(Path::new("nested/secret.env"), false));
    }

    #[test]
    fn anchored_pattern_matches_only_from_root() {
        let m = IgnoreMatcher::from_sources(Some("/build"), None);
        assert!(m.is_ignored(Path::new("build"), true));
        assert!(!m.is_ignored(Path::new("nested/build"), true));
    }

    #[test]
    fn negation_unignores_a_later_match() {
        let m = IgnoreMatcher::from_sources(Some("*.log\n!important.log"), None);
        assert!(m.is_ignored(Path::new("debug.log"), false));
        assert!(!m.is_ignored(Path::new("important.log"), false));
    }

    #[test]
    fn directory_only_pattern_does_not_match_files() {
        let m = IgnoreMatcher::from_sources(Some("build/"), None);
        assert!(m.is_ignored(Path::new("build"), true));
        assert!(!m.is_ignored(Path::new("build"), false));
    }

    #[test]
    fn later_source_wins_over_earlier_negation() {
        // .gitignore un-ignores, .forgeignore re-ignores: forgeignore wins.
        let m = IgnoreMatcher::from_sources(Some("*.log\n!keep.log"), Some("keep.log"));
        assert!(m.is_ignored(Path::new("keep.log"), false));
    }

    #[test]
    fn malformed_pattern_is_treated_literally_not_rejected() {
        let m = IgnoreMatcher::from_sources(Some("weird[pattern"), None);
        // Must not panic and must still produce a usable matcher.
        assert!(!m.is_ignored(Path::new("totally/unrelated.txt"), false));
    }

    #[test]
    fn default_patterns_cover_git_and_secrets() {
        let m = IgnoreMatcher::from_sources(None, None);
        assert!(m.is_ignored(Path::new(".git"), true));
        assert!(m.is_ignored(Path::new(".env"), false));
        assert!(m.is_ignored(Path::new("id_rsa"), false));
    }
}
