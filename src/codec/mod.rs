//! Format codecs and extension-based dispatch.
//!
//! Codecs translate between raw bytes and the format-agnostic tree
//! (`serde_json::Value`). Typed values go through that tree with serde, so
//! every codec supports any `Serialize`/`DeserializeOwned` type.

mod ini;
mod xml;

pub use ini::IniCodec;
pub use xml::XmlCodec;

use crate::error::{ConfigError, ConfigResult};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Number, Value};
use std::path::Path;
use std::sync::Arc;

/// A format-specific encode/decode capability.
pub trait Codec: Send + Sync {
    /// Short format name used in error messages.
    fn format(&self) -> &'static str;

    /// Decode raw content into a tree.
    fn decode(&self, content: &[u8]) -> ConfigResult<Value>;

    /// Encode a tree into raw content.
    fn encode(&self, value: &Value) -> ConfigResult<Vec<u8>>;
}

impl dyn Codec + '_ {
    /// Serialize a typed value with this codec.
    pub fn serialize<T: Serialize>(&self, value: &T) -> ConfigResult<Vec<u8>> {
        let tree =
            serde_json::to_value(value).map_err(|e| ConfigError::serialize(self.format(), e))?;
        self.encode(&tree)
    }

    /// Deserialize content into a fresh typed value.
    ///
    /// The result is built from scratch, so a failure never leaves a
    /// half-populated destination behind.
    pub fn deserialize<T: DeserializeOwned>(&self, content: &[u8]) -> ConfigResult<T> {
        let tree = self.decode(content)?;
        serde_json::from_value(tree).map_err(|e| ConfigError::deserialize(self.format(), e))
    }
}

/// Type untyped text from formats without scalar types: bool, integer,
/// float, else string.
fn infer_scalar(raw: &str) -> Value {
    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(int) = raw.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Ok(float) = raw.parse::<f64>()
        && let Some(number) = Number::from_f64(float)
    {
        return Value::Number(number);
    }
    Value::String(raw.to_string())
}

/// JSON. Decoding accepts JSON5 (comments, trailing commas, unquoted keys)
/// via `json5`; encoding writes plain JSON with `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn format(&self) -> &'static str {
        "JSON"
    }

    fn decode(&self, content: &[u8]) -> ConfigResult<Value> {
        let text =
            std::str::from_utf8(content).map_err(|e| ConfigError::deserialize(self.format(), e))?;
        json5::from_str(text).map_err(|e| ConfigError::deserialize(self.format(), e))
    }

    fn encode(&self, value: &Value) -> ConfigResult<Vec<u8>> {
        serde_json::to_vec_pretty(value).map_err(|e| ConfigError::serialize(self.format(), e))
    }
}

/// YAML via `serde_yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlCodec;

impl Codec for YamlCodec {
    fn format(&self) -> &'static str {
        "YAML"
    }

    fn decode(&self, content: &[u8]) -> ConfigResult<Value> {
        serde_yaml::from_slice(content).map_err(|e| ConfigError::deserialize(self.format(), e))
    }

    fn encode(&self, value: &Value) -> ConfigResult<Vec<u8>> {
        serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| ConfigError::serialize(self.format(), e))
    }
}

/// TOML via `toml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlCodec;

impl Codec for TomlCodec {
    fn format(&self) -> &'static str {
        "TOML"
    }

    fn decode(&self, content: &[u8]) -> ConfigResult<Value> {
        let text =
            std::str::from_utf8(content).map_err(|e| ConfigError::deserialize(self.format(), e))?;
        toml::from_str(text).map_err(|e| ConfigError::deserialize(self.format(), e))
    }

    fn encode(&self, value: &Value) -> ConfigResult<Vec<u8>> {
        toml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| ConfigError::serialize(self.format(), e))
    }
}

/// Ordered mapping from file extension (with leading dot) to codec.
///
/// Iteration order is registration order; the locator tries extensions in
/// this order.
#[derive(Clone, Default)]
pub struct CodecRegistry {
    entries: Vec<(String, Arc<dyn Codec>)>,
}

impl std::fmt::Debug for CodecRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.extensions()).finish()
    }
}

impl CodecRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in codecs: `.json`, `.yml`, `.yaml`, `.toml`,
    /// `.xml`, `.ini`.
    pub fn with_defaults() -> Self {
        let yaml: Arc<dyn Codec> = Arc::new(YamlCodec);
        let mut registry = Self::new();
        registry.register(".json", Arc::new(JsonCodec));
        registry.register(".yml", Arc::clone(&yaml));
        registry.register(".yaml", yaml);
        registry.register(".toml", Arc::new(TomlCodec));
        registry.register(".xml", Arc::new(XmlCodec));
        registry.register(".ini", Arc::new(IniCodec));
        registry
    }

    /// Register a codec for an extension.
    ///
    /// A leading dot is added if missing. Re-registering an extension replaces
    /// its codec and keeps its position.
    pub fn register(&mut self, extension: &str, codec: Arc<dyn Codec>) -> &mut Self {
        let extension = if extension.starts_with('.') {
            extension.to_string()
        } else {
            format!(".{extension}")
        };

        match self.entries.iter_mut().find(|(ext, _)| *ext == extension) {
            Some(entry) => entry.1 = codec,
            None => self.entries.push((extension, codec)),
        }
        self
    }

    /// Registered extensions in iteration order.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(ext, _)| ext.as_str())
    }

    /// Look up the codec for an extension (with leading dot).
    pub fn get(&self, extension: &str) -> Option<Arc<dyn Codec>> {
        self.entries
            .iter()
            .find(|(ext, _)| ext == extension)
            .map(|(_, codec)| Arc::clone(codec))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Pick the codec for a resolved identifier by its file extension.
    pub fn dispatch(&self, identifier: &Path) -> ConfigResult<Arc<dyn Codec>> {
        identifier
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.get(&format!(".{ext}")))
            .ok_or_else(|| ConfigError::NoMatchingCodec {
                identifier: identifier.display().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        value: i64,
        ratio: f64,
        enabled: bool,
    }

    fn sample() -> Sample {
        Sample {
            name: "Mock Name".to_string(),
            value: 12,
            ratio: 0.5,
            enabled: true,
        }
    }

    #[test]
    fn test_default_extension_order() {
        let registry = CodecRegistry::with_defaults();
        let extensions: Vec<_> = registry.extensions().collect();
        assert_eq!(
            extensions,
            vec![".json", ".yml", ".yaml", ".toml", ".xml", ".ini"]
        );
    }

    #[test]
    fn test_dispatch_by_extension() {
        let registry = CodecRegistry::with_defaults();
        let codec = registry.dispatch(Path::new("/etc/app/config.yaml")).unwrap();
        assert_eq!(codec.format(), "YAML");
        let codec = registry.dispatch(Path::new("settings.toml")).unwrap();
        assert_eq!(codec.format(), "TOML");
    }

    #[test]
    fn test_dispatch_unknown_extension_names_identifier() {
        let registry = CodecRegistry::with_defaults();
        let err = match registry.dispatch(Path::new("config.txt")) {
            Err(err) => err,
            Ok(_) => panic!("expected no codec for .txt"),
        };
        assert!(matches!(err, ConfigError::NoMatchingCodec { .. }));
        assert!(err.to_string().contains("config.txt"));
    }

    #[test]
    fn test_dispatch_without_extension_fails() {
        let registry = CodecRegistry::with_defaults();
        assert!(registry.dispatch(Path::new("config")).is_err());
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut registry = CodecRegistry::with_defaults();
        registry.register("json", Arc::new(YamlCodec));
        registry.register("conf", Arc::new(IniCodec));

        let extensions: Vec<_> = registry.extensions().collect();
        assert_eq!(
            extensions,
            vec![".json", ".yml", ".yaml", ".toml", ".xml", ".ini", ".conf"]
        );
        assert_eq!(registry.get(".json").unwrap().format(), "YAML");
    }

    #[test]
    fn test_every_default_codec_round_trips() {
        let registry = CodecRegistry::with_defaults();
        for extension in registry.extensions() {
            let codec = registry.get(extension).unwrap();
            let bytes = codec.serialize(&sample()).unwrap();
            let decoded: Sample = codec.deserialize(&bytes).unwrap();
            assert_eq!(decoded, sample(), "round trip through {extension}");
        }
    }

    #[test]
    fn test_round_trip_keeps_quotes_and_line_breaks() {
        let registry = CodecRegistry::with_defaults();
        let tricky = Sample {
            name: "\"quoted\"\nsecond line".to_string(),
            ..sample()
        };
        for extension in registry.extensions() {
            let codec = registry.get(extension).unwrap();
            let bytes = codec.serialize(&tricky).unwrap();
            let decoded: Sample = codec.deserialize(&bytes).unwrap();
            assert_eq!(decoded, tricky, "round trip through {extension}");
        }
    }

    #[test]
    fn test_json_accepts_comments_and_trailing_commas() {
        let content = b"{\n  // user\n  name: 'Bailey',\n  \"age\": 30,\n  tags: [1, 2,],\n}\n";
        let tree = JsonCodec.decode(content).unwrap();
        assert_eq!(tree["name"], "Bailey");
        assert_eq!(tree["age"], 30);
        assert_eq!(tree["tags"][1], 2);
    }

    #[test]
    fn test_dispatch_xml() {
        let registry = CodecRegistry::with_defaults();
        let codec = registry.dispatch(Path::new("config.xml")).unwrap();
        let decoded: Sample = codec
            .deserialize(b"<config><name>Mock Name</name><value>12</value><ratio>0.5</ratio><enabled>true</enabled></config>")
            .unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn test_deserialize_reports_malformed_input() {
        let codec: Arc<dyn Codec> = Arc::new(JsonCodec);
        let result: ConfigResult<Sample> = codec.deserialize(b"{\"name\": ");
        assert!(matches!(
            result,
            Err(ConfigError::Deserialize { format: "JSON", .. })
        ));
    }

    #[test]
    fn test_deserialize_reports_shape_mismatch() {
        let codec: Arc<dyn Codec> = Arc::new(YamlCodec);
        let result: ConfigResult<Sample> = codec.deserialize(b"name: [1, 2]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_yaml_decodes_nested_tree() {
        let tree = YamlCodec
            .decode(b"name: Bailey\nage: 30\ndb:\n  host: localhost\n")
            .unwrap();
        assert_eq!(tree["name"], "Bailey");
        assert_eq!(tree["age"], 30);
        assert_eq!(tree["db"]["host"], "localhost");
    }
}
