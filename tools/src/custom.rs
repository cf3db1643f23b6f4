//! Custom Tool Registry (spec.md §4.J).
//!
//! A whitelisted directory may contain tool bundles, one per immediate
//! subdirectory: a `tool.yaml` manifest plus an executable entrypoint.
//! The registry re-scans at the start of every turn; a malformed bundle
//! is skipped rather than failing the turn.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::args::{decode_object, optional_u32, required_str};
use crate::contract::{ToolCtx, ToolExecutor, ToolFut, ToolOutcome};
use crate::error::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Number,
    Boolean,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct Manifest {
    name: String,
    description: String,
    version: String,
    entrypoint: String,
    #[serde(default)]
    parameters: Vec<ToolParameter>,
}

#[derive(Debug, Clone)]
pub struct ToolBundle {
    pub name: String,
    pub description: String,
    pub version: String,
    pub entrypoint: PathBuf,
    pub parameters: Vec<ToolParameter>,
}

/// Scans a whitelisted directory of `{tool.yaml, <binary>}` bundles and
/// caches the valid ones.
pub struct CustomToolRegistry {
    dir: PathBuf,
    bundles: RwLock<HashMap<String, ToolBundle>>,
}

impl CustomToolRegistry {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            bundles: RwLock::new(HashMap::new()),
        }
    }

    /// Re-scan `dir`'s immediate subdirectories, replacing the cached
    /// bundle set. Called at the start of each turn (spec.md §4.J).
    pub fn refresh(&self) {
        let mut found = HashMap::new();

        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            *self.bundles.write().unwrap() = found;
            return;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            match load_bundle(&path) {
                Ok(bundle) => {
                    found.insert(bundle.name.clone(), bundle);
                }
                Err(reason) => {
                    tracing::warn!(bundle = %path.display(), %reason, "skipping invalid custom tool bundle");
                }
            }
        }

        *self.bundles.write().unwrap() = found;
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<ToolBundle> {
        self.bundles.read().unwrap().get(name).cloned()
    }

    #[must_use]
    pub fn list(&self) -> Vec<ToolBundle> {
        self.bundles.read().unwrap().values().cloned().collect()
    }
}

fn load_bundle(dir: &Path) -> Result<ToolBundle, String> {
    let manifest_path = dir.join("tool.yaml");
    let raw = std::fs::read_to_string(&manifest_path).map_err(|e| e.to_string())?;
    let manifest: Manifest = serde_yaml::from_str(&raw).map_err(|e| e.to_string())?;

    if manifest.name.trim().is_empty() {
        return Err("name must not be empty".to_string());
    }

    let entrypoint = dir.join(&manifest.entrypoint);
    if !entrypoint.is_file() {
        return Err(format!("entrypoint {} does not exist", entrypoint.display()));
    }
    if !is_executable(&entrypoint) {
        return Err(format!("entrypoint {} is not executable", entrypoint.display()));
    }

    Ok(ToolBundle {
        name: manifest.name,
        description: manifest.description,
        version: manifest.version,
        entrypoint,
        parameters: manifest.parameters,
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(_path: &Path) -> bool {
    true
}

/// Runs a registered custom tool bundle, synthesizing `--key=value`
/// flags from every argument child other than `tool_name`/`timeout`.
#[derive(Default)]
pub struct RunCustomToolTool;

impl ToolExecutor for RunCustomToolTool {
    fn name(&self) -> &'static str {
        "run_custom_tool"
    }

    fn description(&self) -> &'static str {
        "Run a registered custom tool bundle, passing remaining arguments as --key=value flags."
    }

    fn schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "tool_name": { "type": "string" },
                "timeout": { "type": "integer", "minimum": 1, "default": 30 }
            },
            "required": ["tool_name"],
            "additionalProperties": true
        })
    }

    fn execute<'a>(&'a self, ctx: &'a ToolCtx, args_xml: &'a str) -> ToolFut<'a> {
        Box::pin(async move {
            let args = decode_object(args_xml)?;
            let tool_name = required_str(&args, "tool_name")?;
            let timeout_secs = optional_u32(&args, "timeout")?.unwrap_or(30);

            let bundle = ctx
                .custom_tools
                .get(&tool_name)
                .ok_or_else(|| ToolError::NotFound {
                    kind: "custom tool",
                    name: tool_name.clone(),
                })?;

            let mut flags = Vec::new();
            if let serde_json::Value::Object(map) = &args {
                for (key, value) in map {
                    if key == "tool_name" || key == "timeout" {
                        continue;
                    }
                    if let Some(text) = value.as_str() {
                        flags.push(format!("--{key}={text}"));
                    }
                }
            }

            let mut command = tokio::process::Command::new(&bundle.entrypoint);
            command
                .args(&flags)
                .current_dir(ctx.workspace.workspace_dir())
                .stdin(std::process::Stdio::null())
                .stdout(std::process::Stdio::piped())
                .stderr(std::process::Stdio::piped());

            let output = tokio::time::timeout(Duration::from_secs(u64::from(timeout_secs)), command.output())
                .await
                .map_err(|_| ToolError::DeadlineExceeded {
                    elapsed_ms: u64::from(timeout_secs) * 1000,
                })?
                .map_err(|e| ToolError::ExecutionFailed {
                    tool: "run_custom_tool".to_string(),
                    message: e.to_string(),
                })?;

            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            let stderr = String::from_utf8_lossy(&output.stderr);
            if !stderr.is_empty() {
                text.push_str("\nstderr:\n");
                text.push_str(&stderr);
            }

            Ok(ToolOutcome::new(text).with_metadata("exit_code", i64::from(output.status.code().unwrap_or(-1))))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_bundle(dir: &Path, name: &str, script: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(
            dir.join("tool.yaml"),
            format!("name: {name}\ndescription: test\nversion: \"1.0\"\nentrypoint: run.sh\nparameters: []\n"),
        )
        .unwrap();
        let script_path = dir.join("run.sh");
        std::fs::write(&script_path, script).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script_path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
    }

    #[test]
    fn refresh_discovers_valid_bundles() {
        let dir = tempfile::tempdir().unwrap();
        write_bundle(&dir.path().join("greeter"), "greeter", "#!/bin/sh\necho hi\n");
        let registry = CustomToolRegistry::new(dir.path().to_path_buf());
        registry.refresh();
        assert!(registry.get("greeter").is_some());
    }

    #[test]
    fn refresh_skips_bundle_with_nonexecutable_entrypoint() {
        let dir = tempfile::tempdir().unwrap();
        let bundle_dir = dir.path().join("broken");
        std::fs::create_dir_all(&bundle_dir).unwrap();
        std::fs::write(
            bundle_dir.join("tool.yaml"),
            "name: broken\ndescription: test\nversion: \"1.0\"\nentrypoint: run.sh\nparameters: []\n",
        )
        .unwrap();
        std::fs::write(bundle_dir.join("run.sh"), "#!/bin/sh\necho hi\n").unwrap();
        let registry = CustomToolRegistry::new(dir.path().to_path_buf());
        registry.refresh();
        assert!(registry.get("broken").is_none());
    }

    #[test]
    fn refresh_skips_bundle_missing_manifest() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("empty")).unwrap();
        let registry = CustomToolRegistry::new(dir.path().to_path_buf());
        registry.refresh();
        assert!(registry.list().is_empty());
    }
}
