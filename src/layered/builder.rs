//! Builder that folds sources into one configuration map.

use super::merge::deep_merge;
use super::sources::{EnvSource, FileSource, MemorySource, Source};
use super::{ConfigMap, Tree};
use crate::context::LoadContext;
use crate::error::ConfigResult;
use serde_json::Value;
use tracing::debug;

/// Collects sources in order; later sources override earlier ones.
pub struct ConfigBuilder {
    sources: Vec<Box<dyn Source>>,
    context: LoadContext,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Builder whose file sources use the default [`LoadContext`].
    pub fn new() -> Self {
        Self::with_context(LoadContext::default())
    }

    /// Builder whose file sources resolve through `context`.
    pub fn with_context(context: LoadContext) -> Self {
        Self {
            sources: Vec::new(),
            context,
        }
    }

    pub fn add_source(mut self, source: Box<dyn Source>) -> Self {
        self.sources.push(source);
        self
    }

    /// In-memory defaults.
    pub fn add_defaults(self, defaults: Tree) -> Self {
        self.add_source(Box::new(MemorySource::new(defaults)))
    }

    /// A file that must exist and decode.
    pub fn add_file(self, identifier: impl Into<String>) -> Self {
        let source = FileSource::required(identifier, self.context.clone());
        self.add_source(Box::new(source))
    }

    /// A file that is silently skipped if it cannot be loaded.
    pub fn add_optional_file(self, identifier: impl Into<String>) -> Self {
        let source = FileSource::optional(identifier, self.context.clone());
        self.add_source(Box::new(source))
    }

    /// Environment variables under `prefix` with the `__` separator.
    pub fn add_env(self, prefix: impl Into<String>) -> Self {
        self.add_source(Box::new(EnvSource::new(prefix)))
    }

    pub fn add_env_with_separator(
        self,
        prefix: impl Into<String>,
        separator: impl Into<String>,
    ) -> Self {
        self.add_source(Box::new(EnvSource::with_separator(prefix, separator)))
    }

    /// Load every source and merge them in order.
    ///
    /// The first source error aborts the build.
    pub fn build(&self) -> ConfigResult<ConfigMap> {
        let mut merged = Value::Object(Tree::new());
        for (index, source) in self.sources.iter().enumerate() {
            let tree = source.load()?;
            debug!(source = index, keys = tree.len(), "Merging configuration source");
            merged = deep_merge(merged, Value::Object(tree));
        }

        match merged {
            Value::Object(tree) => Ok(ConfigMap::new(tree)),
            _ => Ok(ConfigMap::default()),
        }
    }
}
