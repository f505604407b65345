//! Configuration sources for the layered builder.

use super::Tree;
use crate::configuration::Configuration;
use crate::context::LoadContext;
use crate::error::{ConfigError, ConfigResult};
use serde_json::{Map, Value};
use tracing::debug;

/// Default separator between hierarchy levels in environment variable names.
pub const DEFAULT_ENV_SEPARATOR: &str = "__";

/// Something that produces a configuration tree.
pub trait Source: Send + Sync {
    fn load(&self) -> ConfigResult<Tree>;
}

/// Fixed in-memory values, typically defaults.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    data: Tree,
}

impl MemorySource {
    pub fn new(data: Tree) -> Self {
        Self { data }
    }
}

impl Source for MemorySource {
    fn load(&self) -> ConfigResult<Tree> {
        Ok(self.data.clone())
    }
}

/// A configuration file located and decoded like [`Configuration::reload`].
#[derive(Debug, Clone)]
pub struct FileSource {
    identifier: String,
    required: bool,
    context: LoadContext,
}

impl FileSource {
    /// A file that must exist and decode.
    pub fn required(identifier: impl Into<String>, context: LoadContext) -> Self {
        Self {
            identifier: identifier.into(),
            required: true,
            context,
        }
    }

    /// A file that contributes nothing if it cannot be loaded.
    pub fn optional(identifier: impl Into<String>, context: LoadContext) -> Self {
        Self {
            identifier: identifier.into(),
            required: false,
            context,
        }
    }

    fn load_tree(&self) -> ConfigResult<Tree> {
        let configuration = Configuration::with_context(&self.identifier, self.context.clone());
        let mut value = Value::Null;
        configuration.reload(&mut value)?;
        match value {
            Value::Object(map) => Ok(map),
            _ => Err(ConfigError::NotAMapping {
                identifier: configuration.identifier(),
            }),
        }
    }
}

impl Source for FileSource {
    fn load(&self) -> ConfigResult<Tree> {
        match self.load_tree() {
            Ok(tree) => Ok(tree),
            Err(err) if !self.required => {
                debug!(identifier = %self.identifier, error = %err, "Skipping optional configuration file");
                Ok(Map::new())
            }
            Err(err) => Err(err),
        }
    }
}

/// Environment variables under a prefix, e.g. `APP__DB__HOST` → `db.host`.
#[derive(Debug, Clone)]
pub struct EnvSource {
    prefix: String,
    separator: String,
}

impl EnvSource {
    /// Use the default `__` separator.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_separator(prefix, DEFAULT_ENV_SEPARATOR)
    }

    pub fn with_separator(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
        }
    }

    /// Build a tree from an explicit set of variables.
    ///
    /// Keeps variables starting with `prefix + separator`, strips that,
    /// lower-cases the rest, and splits it on the separator into a key path.
    /// Values are kept as strings.
    pub fn load_from<I, K, V>(&self, vars: I) -> Tree
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let full_prefix = format!("{}{}", self.prefix, self.separator);
        let mut tree = Map::new();

        for (key, value) in vars {
            let Some(rest) = key.as_ref().strip_prefix(&full_prefix) else {
                continue;
            };
            let rest = rest.to_lowercase();
            let parts: Vec<&str> = if self.separator.is_empty() {
                vec![rest.as_str()]
            } else {
                rest.split(self.separator.as_str()).collect()
            };
            set_nested(&mut tree, &parts, Value::String(value.into()));
        }

        tree
    }
}

impl Source for EnvSource {
    fn load(&self) -> ConfigResult<Tree> {
        // Variables that are not valid unicode cannot match a string prefix.
        let vars = std::env::vars_os()
            .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)));
        Ok(self.load_from(vars))
    }
}

/// Set `value` at `parts`, creating intermediate mappings.
///
/// A non-mapping value in the way is replaced by a fresh mapping.
pub fn set_nested(tree: &mut Tree, parts: &[&str], value: Value) {
    let Some((last, parents)) = parts.split_last() else {
        return;
    };

    let mut current = tree;
    for part in parents {
        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(map) = entry else {
            return;
        };
        current = map;
    }
    current.insert(last.to_string(), value);
}
