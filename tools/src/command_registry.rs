//! Command Registry (spec.md §4.E): runs shell commands through a
//! POSIX shell (`sh -c`), streams their output as events, and tracks
//! each running process by [`ExecId`] so it can be canceled — either by
//! its own deadline or by an external cancel request — by killing the
//! whole process group, not just the immediate child (a command that
//! forks children of its own must not survive its parent).

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use forge_types::{AgentEvent, ExecId, ExecIdGenerator, OutputStream};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::broadcast;

use crate::cancel::CancelToken;
use crate::error::ToolError;

/// Outcome of a completed (not necessarily successful) command run.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub exec_id: ExecId,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

struct RunningHandle {
    pid: i32,
}

/// Tracks in-flight subprocesses and lets any holder of an [`ExecId`]
/// request its cancellation.
pub struct CommandRegistry {
    ids: ExecIdGenerator,
    running: Mutex<HashMap<ExecId, RunningHandle>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            ids: ExecIdGenerator::new(),
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Request cancellation of a running command by id. Returns `false`
    /// if no such command is currently running.
    #[must_use]
    pub fn cancel(&self, exec_id: ExecId) -> bool {
        let Some(handle) = self.running.lock().unwrap().get(&exec_id).map(|h| h.pid) else {
            return false;
        };
        kill_process_group(handle);
        true
    }

    #[must_use]
    pub fn running_ids(&self) -> Vec<ExecId> {
        self.running.lock().unwrap().keys().copied().collect()
    }

    /// Run `command` via `sh -c` in `cwd`, streaming output as
    /// [`AgentEvent::CommandOutput`] events, until it exits, the
    /// `timeout` elapses, or `cancel` fires — whichever comes first.
    pub async fn run(
        &self,
        cwd: &Path,
        command: &str,
        timeout: Duration,
        cancel: &CancelToken,
        events: &broadcast::Sender<AgentEvent>,
    ) -> Result<CommandOutcome, ToolError> {
        let exec_id = self.ids.next();
        let started = Instant::now();

        events.send(AgentEvent::CommandExecutionStart {
            exec_id,
            command: command.to_string(),
            cwd: cwd.display().to_string(),
        }).ok();

        let mut child = spawn(cwd, command).map_err(|e| ToolError::ExecutionFailed {
            tool: "execute_command".to_string(),
            message: e.to_string(),
        })?;

        let pid = child.id().ok_or_else(|| ToolError::ExecutionFailed {
            tool: "execute_command".to_string(),
            message: "process exited before it could be tracked".to_string(),
        })?;
        self.running.lock().unwrap().insert(exec_id, RunningHandle { pid: pid as i32 });

        let result = drive(&mut child, exec_id, timeout, cancel, events).await;

        self.running.lock().unwrap().remove(&exec_id);
        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Outcome::Exited { exit_code, stdout, stderr } => {
                events.send(AgentEvent::CommandExecutionComplete { exec_id, exit_code, duration_ms }).ok();
                Ok(CommandOutcome { exec_id, exit_code, stdout, stderr, duration_ms })
            }
            Outcome::TimedOut => {
                kill_process_group(pid as i32);
                let _ = child.wait().await;
                events.send(AgentEvent::CommandExecutionFailed {
                    exec_id,
                    reason: format!("timed out after {}ms", timeout.as_millis()),
                    duration_ms,
                }).ok();
                Err(ToolError::DeadlineExceeded { elapsed_ms: duration_ms })
            }
            Outcome::Canceled => {
                kill_process_group(pid as i32);
                let _ = child.wait().await;
                events.send(AgentEvent::CommandExecutionCanceled { exec_id, duration_ms }).ok();
                Err(ToolError::Canceled)
            }
        }
    }
}

enum Outcome {
    Exited { exit_code: i32, stdout: String, stderr: String },
    TimedOut,
    Canceled,
}

fn spawn(cwd: &Path, command: &str) -> std::io::Result<Child> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(command)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        // SAFETY: setsid() is async-signal-safe and only affects the
        // child process after fork, before exec.
        unsafe {
            cmd.pre_exec(|| {
                libc::setsid();
                Ok(())
            });
        }
    }

    cmd.spawn()
}

async fn drive(
    child: &mut Child,
    exec_id: ExecId,
    timeout: Duration,
    cancel: &CancelToken,
    events: &broadcast::Sender<AgentEvent>,
) -> Outcome {
    let mut stdout_buf = String::new();
    let mut stderr_buf = String::new();

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_task = stdout.map(|pipe| {
        let events = events.clone();
        tokio::spawn(async move { drain(pipe, exec_id, OutputStream::Stdout, events).await })
    });
    let stderr_task = stderr.map(|pipe| {
        let events = events.clone();
        tokio::spawn(async move { drain(pipe, exec_id, OutputStream::Stderr, events).await })
    });

    let wait = child.wait();
    tokio::pin!(wait);

    let outcome = tokio::select! {
        status = &mut wait => {
            let exit_code = status.ok().and_then(|s| s.code()).unwrap_or(-1);
            Outcome::Exited { exit_code, stdout: String::new(), stderr: String::new() }
        }
        () = tokio::time::sleep(timeout) => Outcome::TimedOut,
        () = cancel.canceled() => Outcome::Canceled,
    };

    if let Some(task) = stdout_task {
        if let Ok(collected) = task.await {
            stdout_buf = collected;
        }
    }
    if let Some(task) = stderr_task {
        if let Ok(collected) = task.await {
            stderr_buf = collected;
        }
    }

    match outcome {
        Outcome::Exited { exit_code, .. } => Outcome::Exited {
            exit_code,
            stdout: stdout_buf,
            stderr: stderr_buf,
        },
        other => other,
    }
}

async fn drain<R>(pipe: R, exec_id: ExecId, stream: OutputStream, events: broadcast::Sender<AgentEvent>) -> String
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut reader = BufReader::new(pipe).lines();
    let mut collected = String::new();
    while let Ok(Some(line)) = reader.next_line().await {
        events.send(AgentEvent::CommandOutput { exec_id, stream, chunk: line.clone() }).ok();
        collected.push_str(&line);
        collected.push('\n');
    }
    collected
}

#[cfg(unix)]
fn kill_process_group(pid: i32) {
    // Negative pid targets the whole process group (setsid made pid ==
    // pgid for the child).
    unsafe {
        libc::killpg(pid, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: i32) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn successful_command_reports_exit_code_and_output() {
        let registry = CommandRegistry::new();
        let (tx, mut rx) = broadcast::channel(64);
        let cancel = CancelToken::new();
        let outcome = registry
            .run(Path::new("."), "echo hello", Duration::from_secs(5), &cancel, &tx)
            .await
            .unwrap();
        assert_eq!(outcome.exit_code, 0);
        assert!(outcome.stdout.contains("hello"));
        drop(tx);
        let mut saw_complete = false;
        while let Ok(event) = rx.recv().await {
            if matches!(event, AgentEvent::CommandExecutionComplete { .. }) {
                saw_complete = true;
            }
        }
        assert!(saw_complete);
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported_not_an_error() {
        let registry = CommandRegistry::new();
        let (tx, _rx) = broadcast::channel(64);
        let cancel = CancelToken::new();
        let outcome = registry
            .run(Path::new("."), "exit 3", Duration::from_secs(5), &cancel, &tx)
            .await
            .unwrap();
        assert_eq!(outcome.exit_code, 3);
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let registry = CommandRegistry::new();
        let (tx, _rx) = broadcast::channel(64);
        let cancel = CancelToken::new();
        let result = registry
            .run(Path::new("."), "sleep 5", Duration::from_millis(50), &cancel, &tx)
            .await;
        assert!(matches!(result, Err(ToolError::DeadlineExceeded { .. })));
    }

    #[tokio::test]
    async fn external_cancel_stops_the_command() {
        let registry = CommandRegistry::new();
        let (tx, _rx) = broadcast::channel(64);
        let cancel = CancelToken::new();
        let cancel_clone = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            cancel_clone.cancel();
        });
        let result = registry
            .run(Path::new("."), "sleep 5", Duration::from_secs(5), &cancel, &tx)
            .await;
        assert!(matches!(result, Err(ToolError::Canceled)));
    }
}
