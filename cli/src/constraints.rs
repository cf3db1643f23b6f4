//! Headless constraint enforcement (spec.md §6 "constraints: {timeout,
//! max_files_modified, …}"; §6 "headless mode exits non-zero on
//! constraint violation").

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use forge_types::AgentEvent;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::config::Constraints;

#[derive(Debug, thiserror::Error)]
pub enum ConstraintError {
    #[error("modified {actual} files, exceeding the limit of {limit}")]
    TooManyFilesModified { actual: usize, limit: usize },
}

/// Watches the event stream for `write_file`/`apply_diff` calls and
/// tallies the distinct paths they touched, without needing the agent
/// loop itself to know anything about headless-mode policy.
pub struct FileModificationTracker {
    paths: Arc<Mutex<HashSet<String>>>,
}

const TRACKED_TOOLS: [&str; 2] = ["write_file", "apply_diff"];

impl FileModificationTracker {
    #[must_use]
    pub fn spawn(mut events: broadcast::Receiver<AgentEvent>) -> Self {
        let paths: Arc<Mutex<HashSet<String>>> = Arc::new(Mutex::new(HashSet::new()));
        let sink = Arc::clone(&paths);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(AgentEvent::ToolCallStart { name, args, .. }) if TRACKED_TOOLS.contains(&name.as_str()) => {
                        if let Some(path) = extract_path(&args) {
                            sink.lock().unwrap().insert(path);
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => break,
                }
            }
        });

        Self { paths }
    }

    #[must_use]
    pub fn files_modified(&self) -> usize {
        self.paths.lock().unwrap().len()
    }

    pub fn check(&self, constraints: &Constraints) -> Result<(), ConstraintError> {
        if let Some(limit) = constraints.max_files_modified {
            let actual = self.files_modified();
            if actual > limit {
                return Err(ConstraintError::TooManyFilesModified { actual, limit });
            }
        }
        Ok(())
    }
}

fn extract_path(args_xml: &str) -> Option<String> {
    let (value, _) = forge_tools::decode_xml_args(args_xml).ok()?;
    value.get("path")?.as_str().map(ToString::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time;

    #[tokio::test]
    async fn counts_distinct_paths_touched_by_tracked_tools() {
        let (sender, receiver) = broadcast::channel(16);
        let tracker = FileModificationTracker::spawn(receiver);

        sender
            .send(AgentEvent::ToolCallStart {
                id: "1".into(),
                name: "write_file".into(),
                args: "<arguments><path>a.txt</path><content>x</content></arguments>".into(),
            })
            .unwrap();
        sender
            .send(AgentEvent::ToolCallStart {
                id: "2".into(),
                name: "apply_diff".into(),
                args: "<arguments><path>a.txt</path></arguments>".into(),
            })
            .unwrap();
        sender
            .send(AgentEvent::ToolCallStart {
                id: "3".into(),
                name: "write_file".into(),
                args: "<arguments><path>b.txt</path><content>y</content></arguments>".into(),
            })
            .unwrap();
        sender
            .send(AgentEvent::ToolCallStart {
                id: "4".into(),
                name: "read_file".into(),
                args: "<arguments><path>c.txt</path></arguments>".into(),
            })
            .unwrap();

        time::sleep(Duration::from_millis(20)).await;
        assert_eq!(tracker.files_modified(), 2);
    }

    #[test]
    fn check_passes_when_under_the_limit() {
        let paths = Arc::new(Mutex::new(HashSet::from(["a.txt".to_string()])));
        let tracker = FileModificationTracker { paths };
        let constraints = Constraints { timeout: None, max_files_modified: Some(5) };
        assert!(tracker.check(&constraints).is_ok());
    }

    #[test]
    fn check_fails_when_over_the_limit() {
        let paths = Arc::new(Mutex::new(HashSet::from(["a.txt".to_string(), "b.txt".to_string()])));
        let tracker = FileModificationTracker { paths };
        let constraints = Constraints { timeout: None, max_files_modified: Some(1) };
        let err = tracker.check(&constraints).unwrap_err();
        assert!(matches!(err, ConstraintError::TooManyFilesModified { actual: 2, limit: 1 }));
    }
}
