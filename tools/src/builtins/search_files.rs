//! `search_files` (spec.md §4.D).

use globset::Glob;
use regex::Regex;
use serde_json::json;

use crate::args::{decode_object, optional_str, optional_u32, required_str};
use crate::binary_sniff::is_binary_file;
use crate::contract::{ToolCtx, ToolExecutor, ToolFut, ToolOutcome};
use crate::error::ToolError;

use super::{io_error, walk};

const BINARY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "ico", "webp", "bmp", "pdf", "zip", "gz", "tar", "bz2", "xz",
    "exe", "dll", "so", "dylib", "bin", "class", "jar", "wasm", "woff", "woff2", "ttf", "otf",
];

#[derive(Default)]
pub struct SearchFilesTool;

impl ToolExecutor for SearchFilesTool {
    fn name(&self) -> &'static str {
        "search_files"
    }

    fn description(&self) -> &'static str {
        "Search text files under a path for a regex pattern, with surrounding context lines."
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "pattern": { "type": "string", "description": "Regular expression to search for." },
                "path": { "type": "string", "description": "Directory to search under. Defaults to the workspace root." },
                "file_pattern": { "type": "string", "description": "Glob filter applied to candidate file paths." },
                "context_lines": { "type": "integer", "minimum": 0, "default": 2 }
            },
            "required": ["pattern"]
        })
    }

    fn execute<'a>(&'a self, ctx: &'a ToolCtx, args_xml: &'a str) -> ToolFut<'a> {
        Box::pin(async move {
            let args = decode_object(args_xml)?;
            let pattern = required_str(&args, "pattern")?;
            let path = optional_str(&args, "path");
            let file_pattern = optional_str(&args, "file_pattern");
            let context_lines = optional_u32(&args, "context_lines")?.unwrap_or(2) as usize;

            let regex = Regex::new(&pattern).map_err(|e| ToolError::BadArgs {
                message: format!("invalid regex: {e}"),
            })?;

            let glob = file_pattern
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

            let entries = walk(&ctx.workspace, &root, true).map_err(|e| io_error("search_files", e))?;

            let mut blocks: Vec<String> = Vec::new();
            let mut total_matches = 0usize;

            for entry in entries.iter().filter(|e| !e.is_dir) {
                if let Some(glob) = &glob
                    && !glob.is_match(&entry.relative)
                {
                    continue;
                }
                if has_binary_extension(&entry.relative) {
                    continue;
                }
                if is_binary_file(&entry.absolute).unwrap_or(true) {
                    continue;
                }

                let Ok(content) = std::fs::read_to_string(&entry.absolute) else {
                    continue;
                };
                let lines: Vec<&str> = content.lines().collect();

                for (idx, line) in lines.iter().enumerate() {
                    if !regex.is_match(line) {
                        continue;
                    }
                    total_matches += 1;
                    let start = idx.saturating_sub(context_lines);
                    let end = (idx + context_lines).min(lines.len().saturating_sub(1));

                    let mut block = format!("{}:{}\n", entry.relative.display(), idx + 1);
                    for (n, context_line) in lines.iter().enumerate().take(end + 1).skip(start) {
                        let marker = if n == idx { ">" } else { " " };
                        block.push_str(&format!("{marker} {}: {context_line}\n", n + 1));
                    }
                    blocks.push(block);
                }
            }

            let text = if blocks.is_empty() {
                "No matches found".to_string()
            } else {
                blocks.join("\n")
            };
            Ok(ToolOutcome::new(text).with_metadata("match_count", total_matches as u64))
        })
    }
}

fn has_binary_extension(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
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
    async fn finds_matches_with_context() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.rs"), "one\ntwo\nneedle\nfour\nfive\n").unwrap();
        let ws = Arc::new(Workspace::new(dir.path()).unwrap());
        let tool = SearchFilesTool;
        let outcome = tool
            .execute(&ctx(ws), "<arguments><pattern>needle</pattern></arguments>")
            .await
            .unwrap();
        assert!(outcome.text.contains("> 3: needle"));
        assert!(outcome.text.contains("two"));
        assert!(outcome.text.contains("four"));
        assert_eq!(outcome.metadata["match_count"], 1);
    }

    #[tokio::test]
    async fn skips_binary_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.bin"), [0u8, 1, 2, 3]).unwrap();
        let ws = Arc::new(Workspace::new(dir.path()).unwrap());
        let tool = SearchFilesTool;
        let outcome = tool
            .execute(&ctx(ws), "<arguments><pattern>.</pattern></arguments>")
            .await
            .unwrap();
        assert_eq!(outcome.text, "No matches found");
    }

    #[tokio::test]
    async fn invalid_regex_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Arc::new(Workspace::new(dir.path()).unwrap());
        let tool = SearchFilesTool;
        let err = tool
            .execute(&ctx(ws), "<arguments><pattern>(unclosed</pattern></arguments>")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::BadArgs { .. }));
    }
}
