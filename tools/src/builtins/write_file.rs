//! `write_file` (spec.md §4.D).

use forge_utils::{atomic_write, create_parent_dirs, line_change_counts};
use serde_json::json;

use crate::args::{decode_object, required_str};
use crate::contract::{ToolCtx, ToolExecutor, ToolFut, ToolOutcome};
use crate::error::ToolError;

use super::io_error;

#[derive(Default)]
pub struct WriteFileTool;

impl ToolExecutor for WriteFileTool {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn description(&self) -> &'static str {
        "Create or overwrite a file with the given content."
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Path to write, relative to the workspace root." },
                "content": { "type": "string", "description": "Full file content to write." }
            },
            "required": ["path", "content"]
        })
    }

    fn is_loop_breaking(&self) -> bool {
        false
    }

    fn execute<'a>(&'a self, ctx: &'a ToolCtx, args_xml: &'a str) -> ToolFut<'a> {
        Box::pin(async move {
            let args = decode_object(args_xml)?;
            let path = required_str(&args, "path")?;
            let content = args.get("content").and_then(|v| v.as_str()).unwrap_or("").to_string();

            let resolved = ctx.workspace.validate_path(&path)?;

            let file_exists = resolved.exists();
            let previous = if file_exists {
                std::fs::read_to_string(&resolved).unwrap_or_default()
            } else {
                String::new()
            };
            let counts = line_change_counts(&previous, &content);

            create_parent_dirs(&resolved).map_err(|e| io_error("write_file", e))?;
            atomic_write(&resolved, content.as_bytes()).map_err(|e| io_error("write_file", e))?;

            let size_bytes = content.len() as u64;
            let outcome = ToolOutcome::new(format!(
                "Wrote {} ({size_bytes} bytes, +{}/-{})",
                path, counts.added, counts.removed
            ))
            .with_metadata("file_exists", file_exists)
            .with_metadata("lines_added", counts.added)
            .with_metadata("lines_removed", counts.removed)
            .with_metadata("size_bytes", size_bytes);

            Ok(outcome)
        })
    }
}
