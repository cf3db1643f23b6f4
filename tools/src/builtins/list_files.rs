//! `list_files` (spec.md §4.D).

use globset::Glob;
use serde_json::json;

use crate::args::{decode_object, optional_bool, optional_str};
use crate::contract::{ToolCtx, ToolExecutor, ToolFut, ToolOutcome};
use crate::error::ToolError;

use super::{format_size, io_error, walk};

#[derive(Default)]
pub struct ListFilesTool;

impl ToolExecutor for ListFilesTool {
    fn name(&self) -> &'static str {
        "list_files"
    }

    fn description(&self) -> &'static str {
        "List files and directories under a path, optionally recursively and filtered by glob."
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Directory to list, relative to the workspace root. Defaults to the root." },
                "recursive": { "type": "boolean", "default": false },
                "pattern": { "type": "string", "description": "Glob filter applied to each entry's relative path." }
            }
        })
    }

    fn execute<'a>(&'a self, ctx: &'a ToolCtx, args_xml: &'a str) -> ToolFut<'a> {
        Box::pin(async move {
            let args = decode_object(args_xml)?;
            let path = optional_str(&args, "path");
            let recursive = optional_bool(&args, "recursive", false)?;
            let pattern = optional_str(&args, "pattern");

            let glob = pattern
                .as_deref()
                .map(Glob::new)
                .transpose()
                .map_err(|e| ToolError::BadArgs {
                    message: format!("invalid glob pattern: {e}"),
                })?
                .map(|g| g.compile_matcher());

            let root = match &path {
                Some(p) => ctx.workspace.validate_path(p)?,
                None => ctx.workspace.workspace_dir().to_path_buf(),
            };

            if !root.is_dir() {
                return Err(ToolError::BadArgs {
                    message: format!("{} is not a directory", path.as_deref().unwrap_or(".")),
                });
            }

            let entries = walk(&ctx.workspace, &root, recursive).map_err(|e| io_error("list_files", e))?;

            let mut lines = Vec::new();
            for entry in &entries {
                if let Some(glob) = &glob
                    && !glob.is_match(&entry.relative)
                {
                    continue;
                }
                if entry.is_dir {
                    lines.push(format!("d {}/", entry.relative.display()));
                } else {
                    let size = std::fs::metadata(&entry.absolute).map(|m| m.len()).unwrap_or(0);
                    lines.push(format!("f {} ({})", entry.relative.display(), format_size(size)));
                }
            }

            let text = if lines.is_empty() {
                "(empty)".to_string()
            } else {
                lines.join("\n")
            };
            Ok(ToolOutcome::new(text).with_metadata("count", lines.len() as u64))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use forge_core::Workspace;
    use tokio::sync::broadcast;

    fn ctx(workspace: Arc<Workspace>) -> ToolCtx {
        let (tx, _rx) = broadcast::channel(16);
        ToolCtx {
            workspace,
            commands: Arc::new(crate::command_registry::CommandRegistry::new()),
            custom_tools: Arc::new(crate::custom::CustomToolRegistry::new(std::env::temp_dir())),
            events: tx,
            cancel: crate::cancel::CancelToken::new(),
            tool_call_id: "t1".to_string(),
        }
    }

    #[tokio::test]
    async fn lists_directories_before_files_lexicographically() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("zdir")).unwrap();
        std::fs::write(dir.path().join("afile.txt"), "x").unwrap();
        let ws = Arc::new(Workspace::new(dir.path()).unwrap());
        let tool = ListFilesTool;
        let outcome = tool.execute(&ctx(ws), "<arguments/>").await.unwrap();
        let lines: Vec<_> = outcome.text.lines().collect();
        assert_eq!(lines[0], "d zdir/");
        assert!(lines[1].starts_with("f afile.txt"));
    }

    #[tokio::test]
    async fn path_traversal_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Arc::new(Workspace::new(dir.path()).unwrap());
        let tool = ListFilesTool;
        let err = tool
            .execute(&ctx(ws), "<arguments><path>../outside</path></arguments>")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::BoundaryViolation(_)));
    }

    #[tokio::test]
    async fn recursive_walk_prunes_ignored_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("target")).unwrap();
        std::fs::write(dir.path().join("target/build.o"), "x").unwrap();
        std::fs::create_dir(dir.path().join("src")).unwrap();
        std::fs::write(dir.path().join("src/main.rs"), "x").unwrap();
        let ws = Arc::new(Workspace::new(dir.path()).unwrap());
        let tool = ListFilesTool;
        let outcome = tool
            .execute(&ctx(ws), "<arguments><recursive>true</recursive></arguments>")
            .await
            .unwrap();
        assert!(!outcome.text.contains("build.o"));
        assert!(outcome.text.contains("main.rs"));
    }
}
