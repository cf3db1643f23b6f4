//! XML argument decoder (spec.md §4.C, §6 "Tool-argument wire format",
//! §9 "XML parsing tolerance").
//!
//! Tool arguments arrive as an XML fragment rooted at `<arguments>`.
//! This decodes that fragment into a [`serde_json::Value`] object so
//! each tool can then `serde_json::from_value` into its typed args
//! struct, the same split the teacher's `ToolExecutor::execute` makes
//! between untyped [`serde_json::Value`] and `parse_args::<T>`.
//!
//! Decoding is two-pass: a strict parse first (balanced tags, no
//! leftover input); if that fails, a tolerant pass that doesn't enforce
//! matching end-tag names and auto-closes anything still open at EOF.
//! Neither pass hardcodes the root tag's name — a model that emits
//! `<args>` instead of `<arguments>` is accepted either way, which is
//! what spec.md §9 means by "treat unexpected root as the arguments
//! root".

use std::collections::BTreeMap;

use quick_xml::Reader;
use quick_xml::events::Event;
use serde_json::Value;

/// Which parse path produced the result, kept for diagnostics (spec.md
/// §9: "Record which path succeeded for diagnostics").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodePath {
    Strict,
    Tolerant,
}

#[derive(Debug, thiserror::Error)]
pub enum XmlArgsError {
    #[error("malformed tool arguments: {0}")]
    Malformed(String),
}

/// Decode a `<arguments>...</arguments>` XML fragment into a JSON
/// object, trying the strict parser first and falling back to a
/// tolerant one.
pub fn decode(xml: &str) -> Result<(Value, DecodePath), XmlArgsError> {
    if let Ok(value) = parse(xml, false) {
        return Ok((value, DecodePath::Strict));
    }
    let value = parse(xml, true)?;
    Ok((value, DecodePath::Tolerant))
}

/// Decode, discarding the diagnostic path. Convenience for call sites
/// that don't log which pass succeeded.
pub fn decode_value(xml: &str) -> Result<Value, XmlArgsError> {
    decode(xml).map(|(value, _)| value)
}

fn parse(xml: &str, tolerant: bool) -> Result<Value, XmlArgsError> {
    let mut reader = Reader::from_str(xml);

    let mut buf = Vec::new();

    // Find the opening root tag, whatever it's named.
    let root_name = loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => break e.name().as_ref().to_vec(),
            Ok(Event::Empty(_)) => return Ok(Value::Object(serde_json::Map::new())),
            Ok(Event::Eof) => {
                if tolerant {
                    return Ok(Value::Object(serde_json::Map::new()));
                }
                return Err(XmlArgsError::Malformed("no root element".into()));
            }
            Ok(_) => {
                buf.clear();
                continue;
            }
            Err(e) => {
                if tolerant {
                    return Ok(Value::Object(serde_json::Map::new()));
                }
                return Err(XmlArgsError::Malformed(e.to_string()));
            }
        }
    };
    buf.clear();

    parse_body(&mut reader, &mut buf, tolerant, &root_name)
}

/// Parse everything up to the matching close tag for `expected_name`
/// (ignored under tolerant mode: any End or running out of input ends
/// the body), returning the element's value.
fn parse_body(
    reader: &mut Reader<&[u8]>,
    buf: &mut Vec<u8>,
    tolerant: bool,
    expected_name: &[u8],
) -> Result<Value, XmlArgsError> {
    let mut children: BTreeMap<String, Value> = BTreeMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut text = String::new();

    loop {
        let event = reader.read_event_into(buf);
        match event {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_vec();
                let key = String::from_utf8_lossy(&name).into_owned();
                buf.clear();
                let mut child_buf = Vec::new();
                let value = parse_body(reader, &mut child_buf, tolerant, &name)?;
                insert_child(&mut children, &mut order, key, value);
                continue;
            }
            Ok(Event::Empty(e)) => {
                let key = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                insert_child(&mut children, &mut order, key, Value::String(String::new()));
            }
            Ok(Event::Text(t)) => {
                text.push_str(&t.unescape().unwrap_or_default());
            }
            Ok(Event::CData(t)) => {
                // CDATA is literal text, no entity processing (spec.md §6).
                text.push_str(&String::from_utf8_lossy(t.as_ref()));
            }
            Ok(Event::End(e)) => {
                if tolerant || e.name().as_ref() == expected_name {
                    break;
                }
                // Mismatched close tag in tolerant-disabled strict mode
                // already can't happen (check_end_names handles it), but
                // guard defensively in case of nested mismatches.
                return Err(XmlArgsError::Malformed(format!(
                    "expected closing tag for {}",
                    String::from_utf8_lossy(expected_name)
                )));
            }
            Ok(Event::Eof) => {
                if tolerant {
                    break;
                }
                return Err(XmlArgsError::Malformed(format!(
                    "unclosed tag <{}>",
                    String::from_utf8_lossy(expected_name)
                )));
            }
            Ok(_) => {}
            Err(e) => {
                if tolerant {
                    break;
                }
                return Err(XmlArgsError::Malformed(e.to_string()));
            }
        }
        buf.clear();
    }

    if children.is_empty() {
        Ok(Value::String(text.trim().to_string()))
    } else {
        let mut map = serde_json::Map::new();
        for key in order {
            if let Some(value) = children.remove(&key) {
                map.insert(key, value);
            }
        }
        Ok(Value::Object(map))
    }
}

/// Insert a child value under `key`; a second occurrence of the same
/// tag name promotes the value to a JSON array (spec.md §6 "Lists use a
/// wrapper child").
fn insert_child(
    children: &mut BTreeMap<String, Value>,
    order: &mut Vec<String>,
    key: String,
    value: Value,
) {
    match children.get_mut(&key) {
        None => {
            order.push(key.clone());
            children.insert(key, value);
        }
        Some(Value::Array(arr)) => arr.push(value),
        Some(existing) => {
            let previous = existing.clone();
            *existing = Value::Array(vec![previous, value]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_simple_args_decode() {
        let (value, path) = decode("<arguments><path>a.txt</path></arguments>").unwrap();
        assert_eq!(path, DecodePath::Strict);
        assert_eq!(value["path"], "a.txt");
    }

    #[test]
    fn repeated_child_tags_become_array() {
        let xml = "<arguments><edits><edit><search>a</search><replace>b</replace></edit><edit><search>c</search><replace>d</replace></edit></edits></arguments>";
        let (value, _) = decode(xml).unwrap();
        let edits = value["edits"]["edit"].as_array().unwrap();
        assert_eq!(edits.len(), 2);
        assert_eq!(edits[0]["search"], "a");
        assert_eq!(edits[1]["replace"], "d");
    }

    #[test]
    fn cdata_is_treated_as_literal_text() {
        let xml = "<arguments><content><![CDATA[<not a tag> & raw]]></content></arguments>";
        let (value, _) = decode(xml).unwrap();
        assert_eq!(value["content"], "<not a tag> & raw");
    }

    #[test]
    fn unclosed_tag_falls_back_to_tolerant_pass() {
        let xml = "<arguments><path>a.txt</path>";
        let (value, path) = decode(xml).unwrap();
        assert_eq!(path, DecodePath::Tolerant);
        assert_eq!(value["path"], "a.txt");
    }

    #[test]
    fn unexpected_root_tag_name_is_treated_as_arguments() {
        let (value, path) = decode("<args><path>a.txt</path></args>").unwrap();
        assert_eq!(path, DecodePath::Strict);
        assert_eq!(value["path"], "a.txt");
    }

    #[test]
    fn extra_whitespace_is_tolerated() {
        let xml = "<arguments>\n  <path>  a.txt  </path>\n</arguments>";
        let (value, _) = decode(xml).unwrap();
        assert_eq!(value["path"], "a.txt");
    }

    #[test]
    fn empty_element_decodes_to_empty_string() {
        let (value, _) = decode("<arguments><recursive/></arguments>").unwrap();
        assert_eq!(value["recursive"], "");
    }
}
