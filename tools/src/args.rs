//! Argument-extraction helpers shared by the coding tools.
//!
//! [`xml_args::decode`] turns every leaf into a JSON string (XML has no
//! native integer/boolean type), and turns a repeated child tag into an
//! array only once it has actually repeated. These helpers absorb both
//! quirks so each tool reads typed values instead of re-deriving the
//! same parsing.

use serde_json::Value;

use crate::error::ToolError;
use crate::xml_args;

pub fn decode_object(args_xml: &str) -> Result<Value, ToolError> {
    xml_args::decode_value(args_xml).map_err(|e| ToolError::BadArgs {
        message: e.to_string(),
    })
}

pub fn required_str(value: &Value, key: &str) -> Result<String, ToolError> {
    match value.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        _ => Err(ToolError::BadArgs {
            message: format!("missing required argument: {key}"),
        }),
    }
}

pub fn optional_str(value: &Value, key: &str) -> Option<String> {
    match value.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

pub fn optional_u32(value: &Value, key: &str) -> Result<Option<u32>, ToolError> {
    match value.get(key) {
        None => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => s.trim().parse::<u32>().map(Some).map_err(|_| ToolError::BadArgs {
            message: format!("{key} must be a non-negative integer, got {s:?}"),
        }),
        Some(Value::Number(n)) => Ok(n.as_u64().map(|v| v as u32)),
        Some(other) => Err(ToolError::BadArgs {
            message: format!("{key} must be an integer, got {other}"),
        }),
    }
}

pub fn optional_bool(value: &Value, key: &str, default: bool) -> Result<bool, ToolError> {
    match value.get(key) {
        None => Ok(default),
        Some(Value::String(s)) if s.is_empty() => Ok(default),
        Some(Value::String(s)) => match s.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(ToolError::BadArgs {
                message: format!("{key} must be true or false, got {other:?}"),
            }),
        },
        Some(Value::Bool(b)) => Ok(*b),
        Some(other) => Err(ToolError::BadArgs {
            message: format!("{key} must be a boolean, got {other}"),
        }),
    }
}

/// Normalize a wrapper/item pair (e.g. `edits` containing repeated
/// `edit` children) into a `Vec` regardless of whether zero, one, or
/// many items were present.
pub fn list_of(value: &Value, wrapper: &str, item: &str) -> Vec<Value> {
    let Some(inner) = value.get(wrapper) else {
        return Vec::new();
    };
    match inner {
        Value::String(s) if s.is_empty() => Vec::new(),
        Value::Object(_) => match inner.get(item) {
            Some(Value::Array(items)) => items.clone(),
            Some(single) => vec![single.clone()],
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}
