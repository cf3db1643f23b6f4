//! Workspace Guard (spec.md §4.A) and Ignore Matcher (spec.md §4.B).
//!
//! Everything that touches the filesystem on behalf of a tool call goes
//! through [`Workspace`] first. The guard is the single membership
//! primitive in the system (spec.md §9 "Symlink-resolved boundary"):
//! nothing else compares raw path strings.

mod guard;
mod ignore_matcher;

pub use guard::{GuardError, Workspace};
pub use ignore_matcher::{IgnoreMatcher, Pattern};
