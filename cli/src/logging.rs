//! `tracing-subscriber` setup (SPEC_FULL.md ambient-stack "Logging").
//!
//! Headless mode has no terminal to protect from log noise the way the
//! teacher's TUI does, so records go straight to stderr; `log_level`
//! picks the filter directive and stdout stays free for task output.

use std::io::stderr;

use tracing_subscriber::EnvFilter;

use crate::config::LogLevel;

pub fn init(level: LogLevel) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.filter_directive()));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(stderr).init();
}
