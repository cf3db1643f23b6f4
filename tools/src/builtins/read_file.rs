//! `read_file` (spec.md §4.D).

use serde_json::json;

use crate::args::{decode_object, optional_u32, required_str};
use crate::binary_sniff::is_binary_file;
use crate::contract::{ToolCtx, ToolExecutor, ToolFut, ToolOutcome};
use crate::error::ToolError;

use super::{format_with_line_numbers, io_error};

#[derive(Default)]
pub struct ReadFileTool;

impl ToolExecutor for ReadFileTool {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read a file's contents, optionally restricted to a line range."
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "Path to read, relative to the workspace root." },
                "start_line": { "type": "integer", "minimum": 1, "description": "First line to read (1-indexed)." },
                "end_line": { "type": "integer", "minimum": 1, "description": "Last line to read, inclusive (1-indexed)." }
            },
            "required": ["path"]
        })
    }

    fn execute<'a>(&'a self, ctx: &'a ToolCtx, args_xml: &'a str) -> ToolFut<'a> {
        Box::pin(async move {
            let args = decode_object(args_xml)?;
            let path = required_str(&args, "path")?;
            let start_line = optional_u32(&args, "start_line")?;
            let end_line = optional_u32(&args, "end_line")?;

            if let Some(0) = start_line {
                return Err(ToolError::BadArgs {
                    message: "start_line must be >= 1".to_string(),
                });
            }
            if let (Some(start), Some(end)) = (start_line, end_line)
                && end < start
            {
                return Err(ToolError::BadArgs {
                    message: "end_line must be >= start_line".to_string(),
                });
            }

            let resolved = ctx.workspace.validate_path(&path)?;

            let metadata = std::fs::metadata(&resolved).map_err(|e| io_error("read_file", e))?;
            if metadata.is_dir() {
                return Err(ToolError::BadArgs {
                    message: format!("{path} is a directory, not a file"),
                });
            }

            if is_binary_file(&resolved).map_err(|e| io_error("read_file", e))? {
                if start_line.is_some() || end_line.is_some() {
                    return Err(ToolError::BadArgs {
                        message: "line ranges are not supported for binary files".to_string(),
                    });
                }
                let bytes = std::fs::read(&resolved).map_err(|e| io_error("read_file", e))?;
                return Ok(ToolOutcome::new(format!(
                    "[binary file, {} bytes]",
                    bytes.len()
                )));
            }

            let content = std::fs::read_to_string(&resolved).map_err(|e| io_error("read_file", e))?;
            let total_lines = content.lines().count() as u32;

            let (start, end) = (start_line.unwrap_or(1), end_line.unwrap_or(total_lines.max(1)));
            if start > total_lines && total_lines > 0 {
                return Err(ToolError::BadArgs {
                    message: format!("start_line {start} exceeds file length ({total_lines} lines)"),
                });
            }

            let selected: String = content
                .lines()
                .skip(start.saturating_sub(1) as usize)
                .take((end.saturating_sub(start) + 1) as usize)
                .collect::<Vec<_>>()
                .join("\n");

            let text = format_with_line_numbers(&selected, start);
            Ok(ToolOutcome::new(text))
        })
    }
}
