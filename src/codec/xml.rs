//! XML codec.
//!
//! The root element's name is ignored; its children become the top-level
//! keys. Mapping rules:
//! - Child elements become keys; repeated siblings collect into a sequence
//! - Attributes become `@name` keys, text next to child elements becomes `$text`
//! - Leaf text is typed as bool, integer, float, or string
//! - `<key/>` is null, `<key></key>` is the empty string
//!
//! XML has no scalar types, so a string such as `"42"` reads back as a number.

use super::{Codec, infer_scalar};
use crate::error::{ConfigError, ConfigResult};
use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::{BytesStart, Event};
use serde_json::{Map, Value};

const FORMAT: &str = "XML";
const ROOT_ELEMENT: &str = "config";
const TEXT_KEY: &str = "$text";
const ATTRIBUTE_PREFIX: char = '@';

#[derive(Debug, Clone, Copy, Default)]
pub struct XmlCodec;

impl Codec for XmlCodec {
    fn format(&self) -> &'static str {
        FORMAT
    }

    fn decode(&self, content: &[u8]) -> ConfigResult<Value> {
        let text = std::str::from_utf8(content).map_err(|e| ConfigError::deserialize(FORMAT, e))?;
        parse(text)
    }

    fn encode(&self, value: &Value) -> ConfigResult<Vec<u8>> {
        let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        write_element(&mut out, ROOT_ELEMENT, value, 0)?;
        Ok(out.into_bytes())
    }
}

/// An element whose end tag has not been seen yet.
struct Frame {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> ConfigResult<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut children = Map::new();
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| ConfigError::deserialize(FORMAT, e))?;
            let key = String::from_utf8_lossy(attribute.key.as_ref());
            let value = attribute
                .unescape_value()
                .map_err(|e| ConfigError::deserialize(FORMAT, e))?;
            children.insert(format!("{ATTRIBUTE_PREFIX}{key}"), infer_scalar(&value));
        }
        Ok(Self {
            name,
            children,
            text: String::new(),
        })
    }

    fn close(mut self) -> (String, Value) {
        let value = if self.children.is_empty() {
            if self.text.is_empty() {
                Value::String(String::new())
            } else {
                infer_scalar(&self.text)
            }
        } else {
            if !self.text.is_empty() {
                self.children
                    .insert(TEXT_KEY.to_string(), infer_scalar(&self.text));
            }
            Value::Object(self.children)
        };
        (self.name, value)
    }
}

fn parse(text: &str) -> ConfigResult<Value> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ConfigError::deserialize(FORMAT, e))?;

        let finished = match event {
            Event::Start(start) => {
                stack.push(Frame::open(&start)?);
                None
            }
            Event::Empty(start) => {
                let (name, value) = Frame::open(&start)?.close();
                // An attribute-less empty element carries no value at all.
                let value = match value {
                    Value::String(s) if s.is_empty() => Value::Null,
                    other => other,
                };
                Some((name, value))
            }
            Event::End(_) => stack.pop().map(Frame::close),
            Event::Text(content) => {
                let content = content
                    .unescape()
                    .map_err(|e| ConfigError::deserialize(FORMAT, e))?;
                push_text(&mut stack, &content)?;
                None
            }
            Event::CData(content) => {
                let content = content.into_inner();
                push_text(&mut stack, &String::from_utf8_lossy(&content))?;
                None
            }
            Event::Eof => break,
            _ => None,
        };

        if let Some((name, value)) = finished {
            match stack.last_mut() {
                Some(parent) => insert_child(&mut parent.children, name, value),
                None if root.is_none() => root = Some(value),
                None => {
                    return Err(ConfigError::deserialize(
                        FORMAT,
                        "more than one root element",
                    ));
                }
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(ConfigError::deserialize(
            FORMAT,
            format!("unclosed element <{}>", open.name),
        ));
    }
    root.ok_or_else(|| ConfigError::deserialize(FORMAT, "no root element"))
}

fn push_text(stack: &mut [Frame], content: &str) -> ConfigResult<()> {
    match stack.last_mut() {
        Some(frame) => {
            frame.text.push_str(content);
            Ok(())
        }
        None => Err(ConfigError::deserialize(FORMAT, "text outside the root element")),
    }
}

/// Repeated siblings turn into a sequence in document order.
fn insert_child(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.get_mut(&name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            children.insert(name, value);
        }
    }
}

fn write_element(out: &mut String, name: &str, value: &Value, depth: usize) -> ConfigResult<()> {
    check_name(name)?;
    let indent = "  ".repeat(depth);

    match value {
        Value::Null => {
            out.push_str(&format!("{indent}<{name}/>\n"));
        }
        Value::Array(items) => {
            for item in items {
                if item.is_array() {
                    return Err(ConfigError::serialize(
                        FORMAT,
                        format!("'{name}' holds a nested sequence"),
                    ));
                }
                write_element(out, name, item, depth)?;
            }
        }
        Value::Object(map) => {
            out.push_str(&format!("{indent}<{name}"));
            for (key, attribute) in map {
                if let Some(attribute_name) = key.strip_prefix(ATTRIBUTE_PREFIX) {
                    check_name(attribute_name)?;
                    let rendered = render_scalar(key, attribute)?;
                    out.push_str(&format!(" {attribute_name}=\"{}\"", escape(rendered.as_str())));
                }
            }
            out.push_str(">\n");

            for (key, child) in map {
                if key.starts_with(ATTRIBUTE_PREFIX) {
                    continue;
                }
                if key == TEXT_KEY {
                    let rendered = render_scalar(key, child)?;
                    out.push_str(&format!("{indent}  {}\n", escape(rendered.as_str())));
                    continue;
                }
                write_element(out, key, child, depth + 1)?;
            }
            out.push_str(&format!("{indent}</{name}>\n"));
        }
        scalar => {
            let rendered = render_scalar(name, scalar)?;
            out.push_str(&format!("{indent}<{name}>{}</{name}>\n", escape(rendered.as_str())));
        }
    }
    Ok(())
}

fn render_scalar(key: &str, value: &Value) -> ConfigResult<String> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.clone()),
        Value::Array(_) | Value::Object(_) => Err(ConfigError::serialize(
            FORMAT,
            format!("'{key}' must be a scalar"),
        )),
    }
}

/// Element and attribute names: a letter or `_`, then letters, digits, `-`, `_`, `.`.
fn check_name(name: &str) -> ConfigResult<()> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::serialize(
            FORMAT,
            format!("'{name}' is not a valid XML name"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_nested_elements_and_types() {
        let content = br#"<?xml version="1.0"?>
<config>
  <!-- user -->
  <name>Bailey</name>
  <age>30</age>
  <database port="5432">
    <host>localhost</host>
    <debug>true</debug>
  </database>
</config>
"#;
        let tree = XmlCodec.decode(content).unwrap();
        assert_eq!(
            tree,
            json!({
                "name": "Bailey",
                "age": 30,
                "database": {"@port": 5432, "host": "localhost", "debug": true}
            })
        );
    }

    #[test]
    fn test_repeated_siblings_become_sequence() {
        let tree = XmlCodec
            .decode(b"<config><tag>a</tag><tag>b</tag><tag>c</tag></config>")
            .unwrap();
        assert_eq!(tree, json!({"tag": ["a", "b", "c"]}));
    }

    #[test]
    fn test_empty_elements() {
        let tree = XmlCodec
            .decode(b"<config><missing/><blank></blank></config>")
            .unwrap();
        assert_eq!(tree, json!({"missing": null, "blank": ""}));
    }

    #[test]
    fn test_round_trip_escapes_and_structure() {
        let value = json!({
            "title": "<a & \"b\">",
            "empty": "",
            "none": null,
            "ports": [80, 443],
            "server": {"@id": "main", "host": "example.com"}
        });
        let bytes = XmlCodec.encode(&value).unwrap();
        assert_eq!(XmlCodec.decode(&bytes).unwrap(), value);
    }

    #[test]
    fn test_decode_rejects_mismatched_tags() {
        assert!(XmlCodec.decode(b"<config><a>1</b></config>").is_err());
    }

    #[test]
    fn test_decode_rejects_unclosed_root() {
        let err = XmlCodec.decode(b"<config><a>1</a>").unwrap_err();
        assert!(matches!(err, ConfigError::Deserialize { format: "XML", .. }));
    }

    #[test]
    fn test_encode_rejects_invalid_names() {
        assert!(XmlCodec.encode(&json!({"1st": 1})).is_err());
        assert!(XmlCodec.encode(&json!({"a b": 1})).is_err());
    }
}
