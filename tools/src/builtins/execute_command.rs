//! `execute_command` (spec.md §4.D, §4.E).

use std::time::Duration;

use serde_json::json;

use crate::args::{decode_object, optional_str, optional_u32, required_str};
use crate::contract::{ToolCtx, ToolExecutor, ToolFut, ToolOutcome};
use crate::error::ToolError;

const DEFAULT_TIMEOUT_SECS: u32 = 30;

#[derive(Default)]
pub struct ExecuteCommandTool;

impl ToolExecutor for ExecuteCommandTool {
    fn name(&self) -> &'static str {
        "execute_command"
    }

    fn description(&self) -> &'static str {
        "Run a shell command inside the workspace, with a timeout and cancellation support."
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "command": { "type": "string", "description": "Shell command, run through `sh -c`." },
                "timeout": { "type": "integer", "minimum": 1, "default": DEFAULT_TIMEOUT_SECS, "description": "Timeout in seconds." },
                "working_dir": { "type": "string", "description": "Working directory, relative to the workspace root. Defaults to the root." }
            },
            "required": ["command"]
        })
    }

    fn is_loop_breaking(&self) -> bool {
        false
    }

    fn execute<'a>(&'a self, ctx: &'a ToolCtx, args_xml: &'a str) -> ToolFut<'a> {
        Box::pin(async move {
            let args = decode_object(args_xml)?;
            let command = required_str(&args, "command")?;
            let timeout_secs = optional_u32(&args, "timeout")?.unwrap_or(DEFAULT_TIMEOUT_SECS);
            let working_dir = optional_str(&args, "working_dir");

            let cwd = match &working_dir {
                Some(dir) => ctx.workspace.validate_path(dir)?,
                None => ctx.workspace.workspace_dir().to_path_buf(),
            };

            let timeout = Duration::from_secs(u64::from(timeout_secs));
            let result = ctx
                .commands
                .run(&cwd, &command, timeout, &ctx.cancel, &ctx.events)
                .await;

            match result {
                Ok(outcome) => {
                    let mut text = String::new();
                    if !outcome.stdout.is_empty() {
                        text.push_str(&outcome.stdout);
                    }
                    if !outcome.stderr.is_empty() {
                        if !text.is_empty() {
                            text.push('\n');
                        }
                        text.push_str("stderr:\n");
                        text.push_str(&outcome.stderr);
                    }
                    if !text.ends_with('\n') {
                        text.push('\n');
                    }
                    text.push_str(&format!("Exit code: {}", outcome.exit_code));

                    Ok(ToolOutcome::new(text)
                        .with_metadata("exit_code", i64::from(outcome.exit_code))
                        .with_metadata("duration_ms", outcome.duration_ms))
                }
                Err(ToolError::DeadlineExceeded { elapsed_ms }) => Ok(ToolOutcome::new(format!(
                    "Command timed out after {timeout_secs}s\nExit code: -1"
                ))
                .with_metadata("exit_code", -1i64)
                .with_metadata("duration_ms", elapsed_ms)
                .with_metadata("timed_out", true)),
                Err(ToolError::Canceled) => Ok(ToolOutcome::new("Command was canceled\nExit code: -1")
                    .with_metadata("exit_code", -1i64)
                    .with_metadata("canceled", true)),
                Err(other) => Err(other),
            }
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
    async fn runs_command_and_reports_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Arc::new(Workspace::new(dir.path()).unwrap());
        let tool = ExecuteCommandTool;
        let outcome = tool
            .execute(&ctx(ws), "<arguments><command>echo hi</command></arguments>")
            .await
            .unwrap();
        assert!(outcome.text.contains("hi"));
        assert!(outcome.text.contains("Exit code: 0"));
        assert_eq!(outcome.metadata["exit_code"], 0);
    }

    #[tokio::test]
    async fn timeout_reports_timed_out_text_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Arc::new(Workspace::new(dir.path()).unwrap());
        let tool = ExecuteCommandTool;
        let outcome = tool
            .execute(
                &ctx(ws),
                "<arguments><command>sleep 5</command><timeout>1</timeout></arguments>",
            )
            .await
            .unwrap();
        assert!(outcome.text.contains("timed out"));
        assert_eq!(outcome.metadata["timed_out"], true);
    }

    #[tokio::test]
    async fn rejects_working_dir_outside_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Arc::new(Workspace::new(dir.path()).unwrap());
        let tool = ExecuteCommandTool;
        let err = tool
            .execute(
                &ctx(ws),
                "<arguments><command>echo hi</command><working_dir>../outside</working_dir></arguments>",
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::BoundaryViolation(_)));
    }
}
