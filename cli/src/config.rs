//! Headless YAML configuration (spec.md §6 "Headless configuration")
//! and the CLI > environment > config file > built-in default
//! precedence it shares with the rest of the CLI surface.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    ReadOnly,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Quiet,
    Normal,
    Verbose,
    Debug,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Normal
    }
}

impl LogLevel {
    /// The `tracing-subscriber` filter directive this level maps to.
    /// Quiet emits only warnings/errors; normal adds info; verbose adds
    /// per-tool debug; debug adds internal trace-level events (spec.md
    /// §6 "Event-log formats").
    #[must_use]
    pub fn filter_directive(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Normal => "info",
            Self::Verbose => "forge_tools=debug,info",
            Self::Debug => "trace",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Constraints {
    /// Wall-clock budget for the whole task, in seconds.
    pub timeout: Option<u64>,
    pub max_files_modified: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct HeadlessConfig {
    pub task: String,
    pub mode: Mode,
    pub workspace_dir: Option<PathBuf>,
    #[serde(default)]
    pub constraints: Constraints,
    pub log_level: Option<LogLevel>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read headless config at {}: {source}", path.display())]
    Unreadable { path: PathBuf, source: io::Error },
    #[error("could not parse headless config at {}: {source}", path.display())]
    Malformed { path: PathBuf, source: serde_yaml::Error },
    #[error("--headless was not set; interactive mode is not available in this build")]
    InteractiveModeUnsupported,
}

impl HeadlessConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Three-way precedence: an explicit CLI value wins, then an explicit
/// config-file value, then the caller's default.
pub fn layered<T>(cli: Option<T>, config: Option<T>, default: T) -> T {
    cli.or(config).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_value_wins_over_config_and_default() {
        assert_eq!(layered(Some(1), Some(2), 3), 1);
    }

    #[test]
    fn config_value_wins_over_default() {
        assert_eq!(layered(None, Some(2), 3), 2);
    }

    #[test]
    fn default_used_when_nothing_else_given() {
        assert_eq!(layered::<u32>(None, None, 3), 3);
    }

    #[test]
    fn parses_minimal_headless_config() {
        let yaml = "task: fix the build\nmode: write\n";
        let config: HeadlessConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.task, "fix the build");
        assert_eq!(config.mode, Mode::Write);
        assert!(config.workspace_dir.is_none());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let yaml = "task: t\nmode: read_only\nsome_future_key: 42\n";
        let config: HeadlessConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.mode, Mode::ReadOnly);
    }

    #[test]
    fn missing_task_is_a_validation_error() {
        let yaml = "mode: read_only\n";
        assert!(serde_yaml::from_str::<HeadlessConfig>(yaml).is_err());
    }
}
