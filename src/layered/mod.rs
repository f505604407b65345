//! Layered configuration from multiple sources.
//!
//! Sources are loaded in registration order and deep-merged left to right,
//! so later sources override earlier ones key by key:
//! 1. **Defaults** - in-memory values ([`MemorySource`])
//! 2. **Files** - located and decoded like a typed load ([`FileSource`])
//! 3. **Environment** - `PREFIX__SECTION__KEY` variables ([`EnvSource`])
//!
//! The merged tree is exposed through [`ConfigMap`] with dot-path access.

mod accessor;
mod builder;
mod merge;
mod sources;

use serde_json::{Map, Value};

/// Format-agnostic configuration tree: a mapping of keys to values.
pub type Tree = Map<String, Value>;

pub use accessor::ConfigMap;
pub use builder::ConfigBuilder;
pub use merge::{deep_merge, deep_merge_all};
pub use sources::{DEFAULT_ENV_SEPARATOR, EnvSource, FileSource, MemorySource, Source, set_nested};
