//! prefer: configuration loading library
//!
//! Locates a configuration file by logical name across standard search
//! directories, decodes it by extension (JSON, YAML, TOML, XML, INI), and
//! optionally keeps a typed value live-updated as the file changes.
//! [`layered::ConfigBuilder`] merges defaults, files and environment variables
//! into one tree.
//!
//! ```no_run
//! use serde::Deserialize;
//!
//! #[derive(Debug, Default, Clone, Deserialize)]
//! struct Settings {
//!     name: String,
//!     age: u32,
//! }
//!
//! # fn main() -> prefer::ConfigResult<()> {
//! let mut settings = Settings::default();
//! let configuration = prefer::load("config", &mut settings)?;
//! println!("{} from {}", settings.name, configuration.identifier());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod codec;
pub mod configuration;
pub mod context;
pub mod error;
pub mod fs;
pub mod layered;
pub mod loader;
pub mod locator;
pub mod logging;
pub mod paths;

pub use codec::{Codec, CodecRegistry};
pub use configuration::{
    Configuration, UPDATE_CHANNEL_CAPACITY, load, watch, watch_with_cancel,
};
pub use context::LoadContext;
pub use error::{ConfigError, ConfigResult};
pub use layered::{ConfigBuilder, ConfigMap};
pub use loader::{FileLoader, LoadedContent, Loader, MemoryLoader};
pub use locator::Locator;
pub use paths::standard_paths;
pub use tokio_util::sync::CancellationToken;
