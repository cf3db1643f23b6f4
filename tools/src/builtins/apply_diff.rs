//! `apply_diff` (spec.md §4.D).

use forge_utils::{atomic_write, line_change_counts};
use serde_json::json;

use crate::args::{decode_object, list_of, required_str};
use crate::contract::{ToolCtx, ToolExecutor, ToolFut, ToolOutcome};
use crate::error::ToolError;

use super::io_error;

#[derive(Default)]
pub struct ApplyDiffTool;

struct Edit {
    search: String,
    replace: String,
}

impl ToolExecutor for ApplyDiffTool {
    fn name(&self) -> &'static str {
        "apply_diff"
    }

    fn description(&self) -> &'static str {
        "Apply an ordered list of exact search/replace edits to a file, atomically."
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string" },
                "edits": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "search": { "type": "string", "description": "Text that must appear exactly once in the file." },
                            "replace": { "type": "string" }
                        },
                        "required": ["search", "replace"]
                    }
                }
            },
            "required": ["path", "edits"]
        })
    }

    fn execute<'a>(&'a self, ctx: &'a ToolCtx, args_xml: &'a str) -> ToolFut<'a> {
        Box::pin(async move {
            let args = decode_object(args_xml)?;
            let path = required_str(&args, "path")?;

            let raw_edits = list_of(&args, "edits", "edit");
            if raw_edits.is_empty() {
                return Err(ToolError::BadArgs {
                    message: "edits must contain at least one {search, replace} pair".to_string(),
                });
            }
            let edits: Vec<Edit> = raw_edits
                .iter()
                .map(|e| {
                    let search = e.get("search").and_then(|v| v.as_str()).unwrap_or("").to_string();
                    let replace = e.get("replace").and_then(|v| v.as_str()).unwrap_or("").to_string();
                    Edit { search, replace }
                })
                .collect();

            let resolved = ctx.workspace.validate_path(&path)?;
            let original = std::fs::read_to_string(&resolved).map_err(|e| io_error("apply_diff", e))?;

            let mut buffer = original.clone();
            for edit in &edits {
                if edit.search.is_empty() {
                    return Err(ToolError::BadArgs {
                        message: "edit search text must not be empty".to_string(),
                    });
                }
                let count = buffer.matches(edit.search.as_str()).count();
                match count {
                    0 => {
                        return Err(ToolError::NotFound {
                            kind: "search text",
                            name: format!(
                                "{:?} in {path} — check whitespace and exact wording, then retry with the text as it currently appears in the file",
                                edit.search
                            ),
                        });
                    }
                    1 => {
                        buffer = buffer.replacen(edit.search.as_str(), &edit.replace, 1);
                    }
                    _ => {
                        return Err(ToolError::AmbiguousMatch {
                            file: resolved.clone(),
                            count,
                            guidance: "include more surrounding context in `search` so it matches exactly one location".to_string(),
                        });
                    }
                }
            }

            if buffer == original {
                return Ok(ToolOutcome::new("No changes made"));
            }

            atomic_write(&resolved, buffer.as_bytes()).map_err(|e| io_error("apply_diff", e))?;

            let counts = line_change_counts(&original, &buffer);
            let noun = if edits.len() == 1 { "edit" } else { "edits" };
            let outcome = ToolOutcome::new(format!("Successfully applied {} {noun}", edits.len()))
                .with_metadata("edits_applied", edits.len() as u64)
                .with_metadata("lines_added", counts.added)
                .with_metadata("lines_removed", counts.removed)
                .with_metadata("file_path", path);

            Ok(outcome)
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
    async fn single_unique_edit_applies_and_reports_metadata() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.go"), "package main\n\nfunc old() {\n\treturn\n}\n").unwrap();
        let ws = Arc::new(Workspace::new(dir.path()).unwrap());
        let tool = ApplyDiffTool;
        let xml = "<arguments><path>a.go</path><edits><edit><search>func old() {</search><replace>func newFunc() {</replace></edit></edits></arguments>";
        let outcome = tool.execute(&ctx(ws.clone()), xml).await.unwrap();
        assert!(outcome.text.contains("Successfully applied 1 edit"));
        assert_eq!(outcome.metadata["edits_applied"], 1);
        let after = std::fs::read_to_string(dir.path().join("a.go")).unwrap();
        assert_eq!(after, "package main\n\nfunc newFunc() {\n\treturn\n}\n");
        assert!(!dir.path().join("a.go.tmp").exists());
    }

    #[tokio::test]
    async fn ambiguous_search_aborts_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let original = "fn a() { return err }\nfn b() { return err }\n";
        std::fs::write(dir.path().join("a.rs"), original).unwrap();
        let ws = Arc::new(Workspace::new(dir.path()).unwrap());
        let tool = ApplyDiffTool;
        let xml = "<arguments><path>a.rs</path><edits><edit><search>return err</search><replace>return nil</replace></edit></edits></arguments>";
        let err = tool.execute(&ctx(ws), xml).await.unwrap_err();
        match err {
            ToolError::AmbiguousMatch { count, .. } => assert_eq!(count, 2),
            other => panic!("expected AmbiguousMatch, got {other:?}"),
        }
        let after = std::fs::read_to_string(dir.path().join("a.rs")).unwrap();
        assert_eq!(after, original);
    }

    #[tokio::test]
    async fn identical_result_reports_no_changes_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "same\n").unwrap();
        let ws = Arc::new(Workspace::new(dir.path()).unwrap());
        let tool = ApplyDiffTool;
        let xml = "<arguments><path>a.txt</path><edits><edit><search>same</search><replace>same</replace></edit></edits></arguments>";
        let outcome = tool.execute(&ctx(ws), xml).await.unwrap();
        assert_eq!(outcome.text, "No changes made");
    }
}
