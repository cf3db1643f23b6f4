//! Compile-time embedding of the default system prompt.
//!
//! One prompt, not one per vendor: the `Provider` contract this binary
//! drives against is opaque (spec.md §1), so there's no per-vendor
//! phrasing to pick between the way a concrete multi-provider client
//! would need.

const BASE_PROMPT: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/assets/base_prompt.md"));

/// The built-in system prompt, or the `--prompt` / config override if one was given.
#[must_use]
pub fn system_prompt(override_prompt: Option<&str>) -> String {
    override_prompt.map_or_else(|| BASE_PROMPT.to_string(), ToString::to_string)
}
