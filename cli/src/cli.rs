//! Command-line surface (spec.md §6 "CLI surface").

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "forge", version, about = "Headless terminal coding agent")]
pub struct Cli {
    /// Workspace root. Defaults to the current directory.
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Run one task to completion and exit, instead of starting an
    /// interactive session (the interactive TUI is not part of this
    /// build; omitting this flag is a configuration error).
    #[arg(long)]
    pub headless: bool,

    /// Path to a headless-mode YAML config (spec.md §6 "Headless configuration").
    #[arg(long)]
    pub headless_config: Option<PathBuf>,

    /// Overrides the provider API key (falls back to `FORGE_API_KEY`).
    #[arg(long, env = "FORGE_API_KEY")]
    pub api_key: Option<String>,

    /// Overrides the provider base URL (falls back to `FORGE_BASE_URL`).
    #[arg(long, env = "FORGE_BASE_URL")]
    pub base_url: Option<String>,

    /// Overrides the provider model name (falls back to `FORGE_MODEL`).
    #[arg(long, env = "FORGE_MODEL")]
    pub model: Option<String>,

    /// Overrides the system prompt.
    #[arg(long)]
    pub prompt: Option<String>,
}
