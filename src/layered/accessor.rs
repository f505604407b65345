//! Dot-path access to configuration trees.

use super::Tree;
use crate::configuration::Configuration;
use crate::context::LoadContext;
use crate::error::{ConfigError, ConfigResult};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

const KEY_SEPARATOR: char = '.';

/// A configuration tree addressed with dot-separated keys like `"database.host"`.
///
/// The empty key addresses the whole tree.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigMap {
    // Always a `Value::Object`.
    root: Value,
}

impl Default for ConfigMap {
    fn default() -> Self {
        Self::new(Map::new())
    }
}

impl From<Tree> for ConfigMap {
    fn from(tree: Tree) -> Self {
        Self::new(tree)
    }
}

impl ConfigMap {
    pub fn new(tree: Tree) -> Self {
        Self {
            root: Value::Object(tree),
        }
    }

    /// Load a configuration file into a map using the default context.
    pub fn load(identifier: &str) -> ConfigResult<Self> {
        Self::load_with_context(identifier, LoadContext::default())
    }

    pub fn load_with_context(identifier: &str, context: LoadContext) -> ConfigResult<Self> {
        let configuration = Configuration::with_context(identifier, context);
        let mut tree = Map::new();
        configuration.reload(&mut tree)?;
        Ok(Self::new(tree))
    }

    /// Look up a value. The empty key returns the whole tree.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if key.is_empty() {
            return Some(&self.root);
        }
        key.split(KEY_SEPARATOR)
            .try_fold(&self.root, |node, part| node.as_object()?.get(part))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key)?.as_str()
    }

    /// Integers as-is; floats are truncated.
    pub fn get_int(&self, key: &str) -> Option<i64> {
        let value = self.get(key)?;
        value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
    }

    pub fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_f64()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key)?.as_bool()
    }

    pub fn get_slice(&self, key: &str) -> Option<&[Value]> {
        self.get(key)?.as_array().map(Vec::as_slice)
    }

    pub fn get_map(&self, key: &str) -> Option<&Tree> {
        self.get(key)?.as_object()
    }

    /// Deserialize the value at `key` into a typed value.
    pub fn extract<T: DeserializeOwned>(&self, key: &str) -> ConfigResult<T> {
        let value = self
            .get(key)
            .ok_or_else(|| ConfigError::not_found(key))?;
        T::deserialize(value).map_err(|e| ConfigError::deserialize("tree", e))
    }

    /// Set a value, creating intermediate mappings as needed.
    ///
    /// Fails if the key is empty or an intermediate value is not a mapping.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> ConfigResult<()> {
        if key.is_empty() {
            return Err(ConfigError::invalid_key(key, "key cannot be empty"));
        }

        let parts: Vec<&str> = key.split(KEY_SEPARATOR).collect();
        let (last, parents) = match parts.split_last() {
            Some(split) => split,
            None => return Err(ConfigError::invalid_key(key, "key cannot be empty")),
        };

        let Some(mut current) = self.root.as_object_mut() else {
            return Err(ConfigError::invalid_key(key, "root is not a mapping"));
        };
        for (depth, part) in parents.iter().enumerate() {
            let next = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            let Value::Object(map) = next else {
                let prefix = parts[..=depth].join(".");
                return Err(ConfigError::invalid_key(
                    key,
                    format!("{prefix} is not a mapping"),
                ));
            };
            current = map;
        }

        current.insert(last.to_string(), value.into());
        Ok(())
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The whole tree, same as `get("")`.
    pub fn data(&self) -> &Value {
        &self.root
    }

    pub fn into_inner(self) -> Tree {
        match self.root {
            Value::Object(tree) => tree,
            _ => Map::new(),
        }
    }

    /// Top-level keys in insertion order.
    pub fn keys(&self) -> Vec<&str> {
        self.root
            .as_object()
            .map(|tree| tree.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}
