//! Tool executor framework, coding tools, command registry, and custom
//! tool registry for Forge (spec.md §4.C, §4.D, §4.E, §4.J).

mod args;
pub mod binary_sniff;
pub mod builtins;
pub mod cancel;
pub mod command_registry;
pub mod contract;
pub mod custom;
pub mod error;
pub mod xml_args;

pub use cancel::CancelToken;
pub use command_registry::{CommandOutcome, CommandRegistry};
pub use contract::{Preview, PreviewFut, ToolCtx, ToolExecutor, ToolFut, ToolOutcome, ToolRegistry};
pub use custom::{CustomToolRegistry, ParamType, RunCustomToolTool, ToolBundle, ToolParameter};
pub use error::ToolError;
pub use xml_args::{decode as decode_xml_args, DecodePath, XmlArgsError};

use std::sync::Arc;

use serde_json::Value;

/// Validate decoded tool arguments against a tool's advertised schema
/// before dispatch (spec.md §4.C).
pub fn validate_args(schema: &Value, args: &Value) -> Result<(), ToolError> {
    let validator = jsonschema::validator_for(schema).map_err(|e| ToolError::BadArgs {
        message: format!("invalid tool schema: {e}"),
    })?;
    if let Err(err) = validator.validate(args) {
        return Err(ToolError::BadArgs {
            message: err.to_string(),
        });
    }
    Ok(())
}

/// Build a [`ToolRegistry`] pre-populated with the six coding tools and
/// the custom-tool runner, in the order spec.md §4.G expects them
/// advertised to the provider.
pub fn default_registry() -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(builtins::ReadFileTool))?;
    registry.register(Arc::new(builtins::WriteFileTool))?;
    registry.register(Arc::new(builtins::ListFilesTool))?;
    registry.register(Arc::new(builtins::SearchFilesTool))?;
    registry.register(Arc::new(builtins::ApplyDiffTool))?;
    registry.register(Arc::new(builtins::ExecuteCommandTool))?;
    registry.register(Arc::new(RunCustomToolTool))?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_no_duplicate_names() {
        let registry = default_registry().unwrap();
        assert_eq!(registry.len(), 7);
    }

    #[test]
    fn validate_args_accepts_matching_arguments() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": { "path": { "type": "string" } },
            "required": ["path"]
        });
        let args = serde_json::json!({ "path": "src/main.rs" });
        assert!(validate_args(&schema, &args).is_ok());
    }

    #[test]
    fn validate_args_rejects_a_missing_required_field() {
        let schema = serde_json::json!({
            "type": "object",
            "properties": { "path": { "type": "string" } },
            "required": ["path"]
        });
        let args = serde_json::json!({});
        let err = validate_args(&schema, &args).unwrap_err();
        assert!(matches!(err, ToolError::BadArgs { .. }));
    }
}
