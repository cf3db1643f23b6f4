//! Forge CLI - binary entry point: process wiring for the headless
//! executor (spec.md §6 "External Interfaces"). The TUI, the Provider
//! wire protocol, and git/PR automation are all out of scope; what's
//! left to assemble here is CLI flags, headless YAML configuration,
//! logging, and exit codes around the already-built core runtime.

mod assets;
mod cli;
mod config;
mod constraints;
mod logging;
mod provider;

use std::collections::HashSet;
use std::env;
use std::fmt;
use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use forge_context::{ContextManager, GoalBatchCompaction, ThresholdSummarization, ToolCallSummarization};
use forge_core::Workspace;
use forge_engine::{AgentLoop, EventStream, NoteStore};
use forge_tools::{CancelToken, CommandRegistry, CustomToolRegistry};
use forge_types::Provider;
use tokio::signal;
use tokio::time;

use crate::cli::Cli;
use crate::config::{ConfigError, HeadlessConfig, Mode};
use crate::constraints::{ConstraintError, FileModificationTracker};
use crate::provider::ProviderConfig;

/// Tools a `read_only` headless task may not invoke (spec.md §4.G
/// "Disabled tools (configured per mode)"). `run_custom_tool` is
/// included because a custom tool bundle's own behavior isn't
/// constrained by the Guard's mode, so it's treated as mutating.
fn disabled_tools_for(mode: Mode) -> HashSet<String> {
    match mode {
        Mode::Write => HashSet::new(),
        Mode::ReadOnly => ["write_file", "apply_diff", "execute_command", "run_custom_tool"]
            .into_iter()
            .map(String::from)
            .collect(),
    }
}

fn resolve_workspace_dir(cli: &Cli, config: &HeadlessConfig) -> PathBuf {
    cli.workspace
        .clone()
        .or_else(|| env::var_os("FORGE_WORKSPACE_DIR").map(PathBuf::from))
        .or_else(|| config.workspace_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn configuration_error(message: impl fmt::Display) -> ExitCode {
    eprintln!("configuration error: {message}");
    ExitCode::from(2)
}

enum RunOutcome {
    Completed,
    ConstraintViolation(ConstraintError),
}

/// Assembles the workspace guard, tool registry, context manager, and
/// agent loop, then drives the configured task through one turn.
/// Construction failures and a timed-out task are reported as `anyhow`
/// errors; a constraint violation after a completed turn is reported
/// through [`RunOutcome`] since it isn't a failure of the run itself.
async fn run(cli: &Cli, config: &HeadlessConfig) -> anyhow::Result<RunOutcome> {
    let workspace_dir = resolve_workspace_dir(cli, config);
    let workspace = Arc::new(Workspace::new(&workspace_dir).context("constructing workspace guard")?);
    let tools = Arc::new(forge_tools::default_registry().context("building tool registry")?);

    let commands = Arc::new(CommandRegistry::new());
    let custom_tools_dir = workspace.workspace_dir().join(".forge").join("tools");
    let custom_tools = Arc::new(CustomToolRegistry::new(custom_tools_dir));
    let notes = Arc::new(NoteStore::new());
    let events = EventStream::new();
    let tracker = FileModificationTracker::spawn(events.subscribe());

    let provider_config = ProviderConfig { api_key: cli.api_key.clone(), base_url: cli.base_url.clone(), model: cli.model.clone() };
    let provider = provider::build_provider(&provider_config, &config.task);
    let system_prompt = assets::system_prompt(cli.prompt.as_deref());

    let mut context = ContextManager::new(Arc::clone(&provider), provider.context_limit(), system_prompt)
        .with_strategy(Box::new(ThresholdSummarization::new(80)))
        .with_strategy(Box::new(ToolCallSummarization::new(4, 3, 20)))
        .with_strategy(Box::new(GoalBatchCompaction::new(6, 3, 10)));

    let disabled_tools = disabled_tools_for(config.mode);
    let agent_loop = AgentLoop::new(provider, tools, disabled_tools, Arc::clone(&workspace), commands, custom_tools, notes, &events);

    let cancel = CancelToken::new();
    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            cancel_on_signal.cancel();
        }
    });

    let turn = agent_loop.run_turn(&mut context, config.task.clone(), &cancel);
    run_with_timeout(turn, config.constraints.timeout, &cancel).await?;

    tracing::info!(category = "agent", tokens = context.counted_tokens(), "turn complete");

    Ok(match tracker.check(&config.constraints) {
        Ok(()) => RunOutcome::Completed,
        Err(violation) => RunOutcome::ConstraintViolation(violation),
    })
}

async fn run_with_timeout<F>(turn: F, timeout_secs: Option<u64>, cancel: &CancelToken) -> anyhow::Result<()>
where
    F: Future<Output = Result<(), forge_engine::AgentError>>,
{
    let result = match timeout_secs {
        Some(secs) => match time::timeout(Duration::from_secs(secs), turn).await {
            Ok(result) => result,
            Err(_) => {
                cancel.cancel();
                anyhow::bail!("task exceeded its {secs}s timeout");
            }
        },
        None => turn.await,
    };
    result.context("agent turn failed")
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if !cli.headless {
        return configuration_error(ConfigError::InteractiveModeUnsupported);
    }

    let Some(headless_config_path) = cli.headless_config.clone() else {
        return configuration_error("--headless requires --headless-config <path>");
    };

    let config = match HeadlessConfig::load(&headless_config_path) {
        Ok(config) => config,
        Err(e) => return configuration_error(e),
    };

    logging::init(config.log_level.unwrap_or_default());
    tracing::info!(category = "startup", task = %config.task, mode = ?config.mode, "starting headless run");

    match run(&cli, &config).await {
        Ok(RunOutcome::Completed) => ExitCode::SUCCESS,
        Ok(RunOutcome::ConstraintViolation(e)) => {
            tracing::error!(category = "agent", error = %e, "constraint violation");
            ExitCode::from(1)
        }
        Err(e) => {
            tracing::error!(category = "agent", error = %e, "headless run failed");
            ExitCode::from(1)
        }
    }
}
