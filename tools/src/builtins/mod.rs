//! The six coding tools (spec.md §4.D).

mod apply_diff;
mod execute_command;
mod list_files;
mod read_file;
mod search_files;
mod write_file;

pub use apply_diff::ApplyDiffTool;
pub use execute_command::ExecuteCommandTool;
pub use list_files::ListFilesTool;
pub use read_file::ReadFileTool;
pub use search_files::SearchFilesTool;
pub use write_file::WriteFileTool;

use std::path::{Path, PathBuf};

use forge_core::Workspace;

use crate::error::ToolError;

/// Prefix every line with its 1-based line number, `"<n> | "` (spec.md
/// §4.D `read_file`).
pub(crate) fn format_with_line_numbers(content: &str, start: u32) -> String {
    let mut out = String::new();
    for (offset, line) in content.lines().enumerate() {
        let number = start as usize + offset;
        out.push_str(&format!("{number} | {line}\n"));
    }
    out
}

pub(crate) fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} {}", UNITS[unit])
    } else {
        format!("{size:.1} {}", UNITS[unit])
    }
}

/// One filesystem entry discovered under a walk root.
pub(crate) struct WalkEntry {
    pub absolute: PathBuf,
    pub relative: PathBuf,
    pub is_dir: bool,
}

/// Walk `root` (already boundary-checked), honoring the workspace's
/// ignore rules and pruning ignored directories rather than descending
/// into them. Non-recursive walks list only `root`'s direct children.
pub(crate) fn walk(workspace: &Workspace, root: &Path, recursive: bool) -> std::io::Result<Vec<WalkEntry>> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let mut children: Vec<_> = std::fs::read_dir(&dir)?.collect::<Result<_, _>>()?;
        children.sort_by_key(std::fs::DirEntry::file_name);

        for child in children {
            let absolute = child.path();
            let relative = workspace.make_relative(&absolute);
            let is_dir = child.file_type().map(|t| t.is_dir()).unwrap_or(false);

            if workspace.ignore_matcher().is_ignored(&relative, is_dir) {
                continue;
            }

            if is_dir && recursive {
                stack.push(absolute.clone());
            }

            out.push(WalkEntry {
                absolute,
                relative,
                is_dir,
            });
        }
    }

    out.sort_by(|a, b| match (a.is_dir, b.is_dir) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a.relative.cmp(&b.relative),
    });

    Ok(out)
}

pub(crate) fn io_error(tool: &'static str, err: std::io::Error) -> ToolError {
    ToolError::ExecutionFailed {
        tool: tool.to_string(),
        message: err.to_string(),
    }
}
