//! INI codec.
//!
//! Root `key = value` pairs become top-level keys; each `[section]` becomes a
//! nested mapping. Values are typed as bool, integer, float, or string.

use super::{Codec, infer_scalar};
use crate::error::{ConfigError, ConfigResult};
use serde_json::{Map, Value};

const FORMAT: &str = "INI";

#[derive(Debug, Clone, Copy, Default)]
pub struct IniCodec;

impl Codec for IniCodec {
    fn format(&self) -> &'static str {
        FORMAT
    }

    fn decode(&self, content: &[u8]) -> ConfigResult<Value> {
        let text = std::str::from_utf8(content).map_err(|e| ConfigError::deserialize(FORMAT, e))?;
        parse(text).map(Value::Object)
    }

    fn encode(&self, value: &Value) -> ConfigResult<Vec<u8>> {
        let Value::Object(root) = value else {
            return Err(ConfigError::serialize(FORMAT, "root must be a mapping"));
        };

        let mut out = String::new();
        let mut sections = Vec::new();

        for (key, value) in root {
            match value {
                Value::Object(section) => sections.push((key, section)),
                other => write_pair(&mut out, key, other)?,
            }
        }

        for (name, section) in sections {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push('[');
            out.push_str(name);
            out.push_str("]\n");
            for (key, value) in section {
                write_pair(&mut out, key, value)?;
            }
        }

        Ok(out.into_bytes())
    }
}

fn parse(text: &str) -> ConfigResult<Map<String, Value>> {
    let mut root = Map::new();
    let mut section: Option<String> = None;

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim();
            if name.is_empty() {
                return Err(ConfigError::deserialize(
                    FORMAT,
                    format!("empty section name at line {}", index + 1),
                ));
            }
            root.entry(name.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            section = Some(name.to_string());
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            return Err(ConfigError::deserialize(
                FORMAT,
                format!("expected 'key = value' at line {}", index + 1),
            ));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::deserialize(
                FORMAT,
                format!("missing key at line {}", index + 1),
            ));
        }

        let target = match &section {
            Some(name) => match root.get_mut(name) {
                Some(Value::Object(map)) => map,
                _ => {
                    return Err(ConfigError::deserialize(
                        FORMAT,
                        format!("section [{name}] collides with a root key"),
                    ));
                }
            },
            None => &mut root,
        };
        target.insert(key.to_string(), parse_scalar(value.trim()));
    }

    Ok(root)
}

/// Type a raw INI value: bool, integer, float, else string.
///
/// Double-quoted values are always strings and honour `\\`, `\"`, `\n`,
/// `\r` and `\t` escapes. Single quotes are stripped verbatim.
fn parse_scalar(raw: &str) -> Value {
    if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        return Value::String(unescape(&raw[1..raw.len() - 1]));
    }
    if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
        return Value::String(raw[1..raw.len() - 1].to_string());
    }
    infer_scalar(raw)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            // Unknown escapes are kept as written.
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Strings are written bare only when they read back unchanged.
fn needs_quotes(s: &str) -> bool {
    s.trim() != s
        || s.contains(['"', '\'', '\n', '\r'])
        || !matches!(parse_scalar(s), Value::String(_))
}

fn write_pair(out: &mut String, key: &str, value: &Value) -> ConfigResult<()> {
    let rendered = match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) if needs_quotes(s) => escape(s),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => {
            return Err(ConfigError::serialize(
                FORMAT,
                format!("'{key}' is nested too deeply for INI"),
            ));
        }
    };
    out.push_str(key);
    out.push_str(" = ");
    out.push_str(&rendered);
    out.push('\n');
    Ok(())
}
