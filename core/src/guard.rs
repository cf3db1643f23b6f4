//! Workspace Guard (spec.md §4.A).
//!
//! The guard is constructed once per session from the workspace root
//! and mutated only through [`Workspace::add_whitelist`] /
//! [`Workspace::clear_whitelist`] (spec.md §3 "Lifecycle"). Every other
//! method is a pure read over the current root/whitelist snapshot.
//!
//! Grounded on the teacher's `forge-tools::sandbox::Sandbox`: the same
//! deepest-existing-ancestor canonicalization trick so not-yet-created
//! files still resolve to a stable absolute path, and the same
//! string-prefix-on-canonical-paths membership test.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::ignore_matcher::IgnoreMatcher;

/// Errors the guard can report (spec.md §7: "boundary violation",
/// "ignored path", plus the construction-time configuration error).
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    #[error("path must not be empty")]
    EmptyPath,
    #[error("could not determine home directory for `~` expansion")]
    HomeNotFound,
    #[error("could not resolve workspace root {}: {source}", path.display())]
    RootUnresolvable { path: PathBuf, source: io::Error },
    #[error("could not resolve path {}: {source}", path.display())]
    Unresolvable { path: PathBuf, source: io::Error },
    #[error("path outside workspace (attempted: {}, resolved: {})", attempted.display(), resolved.display())]
    OutsideWorkspace { attempted: PathBuf, resolved: PathBuf },
    #[error("path is ignored: {}", path.display())]
    Ignored { path: PathBuf },
}

/// Resolve symlinks on the deepest existing ancestor of `path`, then
/// re-append the trailing components that don't exist yet, so a file
/// that hasn't been created yet still canonicalizes to the path it will
/// occupy once it is (spec.md §4.A step 5).
fn canonicalize_tolerant(path: &Path) -> io::Result<PathBuf> {
    if path.exists() {
        return fs::canonicalize(path);
    }

    let mut trailing: Vec<std::ffi::OsString> = Vec::new();
    let mut ancestor = path;
    loop {
        if ancestor.exists() {
            break;
        }
        let Some(name) = ancestor.file_name() else {
            break;
        };
        trailing.push(name.to_os_string());
        match ancestor.parent() {
            Some(p) => ancestor = p,
            None => break,
        }
    }

    let canonical_ancestor = fs::canonicalize(ancestor)?;
    let mut result = canonical_ancestor;
    for part in trailing.into_iter().rev() {
        result.push(part);
    }
    Ok(result)
}

/// Collapse `.` and `..` components without touching the filesystem
/// (the filesystem-aware resolution happens separately in
/// [`canonicalize_tolerant`]).
fn lexically_clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            std::path::Component::CurDir => {}
            std::path::Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn expand_home(input: &str) -> io::Result<PathBuf> {
    if input == "~" || input.starts_with("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| io::Error::other("home directory not found"))?;
        return Ok(if input == "~" {
            home
        } else {
            home.join(&input[2..])
        });
    }
    Ok(PathBuf::from(input))
}

/// The workspace security guard (spec.md §4.A).
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    whitelist: RwLock<Vec<PathBuf>>,
    ignore: IgnoreMatcher,
}

impl Workspace {
    /// Create a guard rooted at `root`. The root must already exist.
    /// Loads `.gitignore`/`.forgeignore` from the root if present
    /// (spec.md §4.B).
    pub fn new(root: impl AsRef<Path>) -> Result<Self, GuardError> {
        let root = root.as_ref();
        let canonical = fs::canonicalize(root).map_err(|source| GuardError::RootUnresolvable {
            path: root.to_path_buf(),
            source,
        })?;

        let gitignore = fs::read_to_string(canonical.join(".gitignore")).ok();
        let forgeignore = fs::read_to_string(canonical.join(".forgeignore")).ok();
        let ignore = IgnoreMatcher::from_sources(gitignore.as_deref(), forgeignore.as_deref());

        Ok(Self {
            root: canonical,
            whitelist: RwLock::new(Vec::new()),
            ignore,
        })
    }

    #[must_use]
    pub fn workspace_dir(&self) -> &Path {
        &self.root
    }

    /// Resolve `input` to an absolute path and enforce the workspace
    /// boundary, without consulting the ignore matcher (spec.md §4.A
    /// `ResolvePath`).
    pub fn resolve_path(&self, input: &str) -> Result<PathBuf, GuardError> {
        if input.is_empty() {
            return Err(GuardError::EmptyPath);
        }

        let expanded = expand_home(input).map_err(|_| GuardError::HomeNotFound)?;
        let joined = if expanded.is_absolute() {
            expanded
        } else {
            self.root.join(expanded)
        };
        let cleaned = lexically_clean(&joined);

        let canonical = canonicalize_tolerant(&cleaned).map_err(|source| GuardError::Unresolvable {
            path: cleaned.clone(),
            source,
        })?;

        if !self.is_within_workspace(&canonical) {
            return Err(GuardError::OutsideWorkspace {
                attempted: cleaned,
                resolved: canonical,
            });
        }

        Ok(canonical)
    }

    /// Like [`Self::resolve_path`], but additionally rejects ignored
    /// paths (spec.md §4.A `ValidatePath`, used by read/write/search
    /// tools before touching the filesystem).
    pub fn validate_path(&self, input: &str) -> Result<PathBuf, GuardError> {
        let resolved = self.resolve_path(input)?;
        if self.should_ignore(input)? {
            return Err(GuardError::Ignored { path: resolved });
        }
        Ok(resolved)
    }

    /// String-prefix membership test against the canonical root or any
    /// canonical whitelist entry (spec.md §9 "the single membership
    /// primitive").
    #[must_use]
    pub fn is_within_workspace(&self, absolute: &Path) -> bool {
        is_prefix_or_equal(&self.root, absolute)
            || self
                .whitelist
                .read()
                .expect("whitelist lock poisoned")
                .iter()
                .any(|entry| is_prefix_or_equal(entry, absolute))
    }

    /// Strip the workspace root (or whichever whitelist entry contains
    /// `absolute`) to produce a relative path.
    #[must_use]
    pub fn make_relative(&self, absolute: &Path) -> PathBuf {
        if let Ok(rel) = absolute.strip_prefix(&self.root) {
            return rel.to_path_buf();
        }
        for entry in self.whitelist.read().expect("whitelist lock poisoned").iter() {
            if let Ok(rel) = absolute.strip_prefix(entry) {
                return rel.to_path_buf();
            }
        }
        absolute.to_path_buf()
    }

    /// Whether `input` is excluded by the ignore rule set (spec.md
    /// §4.A `ShouldIgnore`). Whitelisted paths are always allowed,
    /// regardless of ignore rules (spec.md §3).
    pub fn should_ignore(&self, input: &str) -> Result<bool, GuardError> {
        let resolved = self.resolve_path(input)?;
        if self
            .whitelist
            .read()
            .expect("whitelist lock poisoned")
            .iter()
            .any(|entry| is_prefix_or_equal(entry, &resolved))
        {
            return Ok(false);
        }

        let relative = self.make_relative(&resolved);
        let is_dir = fs::metadata(&resolved).map(|m| m.is_dir()).unwrap_or(false);
        Ok(self.ignore.is_ignored(&relative, is_dir))
    }

    /// Add a directory to the whitelist (spec.md §4.A `AddWhitelist`).
    /// Non-existent directories are accepted by resolving symlinks on
    /// the deepest existing ancestor. Duplicates are silently ignored.
    pub fn add_whitelist(&self, dir: impl AsRef<Path>) -> Result<(), GuardError> {
        let dir = dir.as_ref();
        let cleaned = lexically_clean(dir);
        let canonical = canonicalize_tolerant(&cleaned).map_err(|source| GuardError::Unresolvable {
            path: cleaned,
            source,
        })?;

        let mut whitelist = self.whitelist.write().expect("whitelist lock poisoned");
        if !whitelist.iter().any(|existing| existing == &canonical) {
            whitelist.push(canonical);
        }
        Ok(())
    }

    pub fn clear_whitelist(&self) {
        self.whitelist.write().expect("whitelist lock poisoned").clear();
    }

    /// Defensive copy of the current whitelist (spec.md §4.A
    /// `GetWhitelist`).
    #[must_use]
    pub fn whitelist(&self) -> Vec<PathBuf> {
        self.whitelist.read().expect("whitelist lock poisoned").clone()
    }

    #[must_use]
    pub fn ignore_matcher(&self) -> &IgnoreMatcher {
        &self.ignore
    }
}

fn is_prefix_or_equal(entry: &Path, candidate: &Path) -> bool {
    if candidate == entry {
        return true;
    }
    candidate.starts_with(entry)
}
