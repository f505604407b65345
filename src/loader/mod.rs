//! Loaders read configuration content and watch it for changes.

pub mod watcher;

use crate::context::LoadContext;
use crate::error::{ConfigError, ConfigResult};
use crate::locator::Locator;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use watcher::{WatcherFactory, spawn_watch};

/// Raw content read from a resolved location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedContent {
    /// The resolved path the content came from.
    pub path: PathBuf,
    pub content: Vec<u8>,
}

/// Reads configuration content and reports changes to it.
pub trait Loader: Send + Sync {
    /// The identifier this loader was created for.
    fn identifier(&self) -> &str;

    /// Resolve and read the full content.
    fn load(&self) -> ConfigResult<LoadedContent>;

    /// Watch with a session that only ends when the event source closes or
    /// `notify`'s receiver is dropped.
    fn watch(&self, notify: mpsc::Sender<bool>) -> ConfigResult<()> {
        self.watch_with_cancel(notify, CancellationToken::new())
    }

    /// Start watching. Returns once the watch is registered; change
    /// notifications arrive on `notify` afterwards until `cancel` fires.
    fn watch_with_cancel(
        &self,
        notify: mpsc::Sender<bool>,
        cancel: CancellationToken,
    ) -> ConfigResult<()>;
}

/// Loads configuration from a file resolved through the search paths.
#[derive(Clone)]
pub struct FileLoader {
    identifier: String,
    locator: Locator,
    watchers: Arc<dyn WatcherFactory>,
}

impl std::fmt::Debug for FileLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileLoader")
            .field("identifier", &self.identifier)
            .finish_non_exhaustive()
    }
}

impl FileLoader {
    /// Create a loader for `identifier`. An empty identifier is an error.
    pub fn new(identifier: impl Into<String>, context: &LoadContext) -> ConfigResult<Self> {
        let identifier = identifier.into();
        if identifier.is_empty() {
            return Err(ConfigError::EmptyIdentifier);
        }
        Ok(Self {
            identifier,
            locator: context.locator(),
            watchers: Arc::clone(context.watchers()),
        })
    }

    /// Resolve the identifier to a concrete file.
    pub fn locate(&self) -> ConfigResult<PathBuf> {
        self.locator.locate(&self.identifier)
    }
}

impl Loader for FileLoader {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn load(&self) -> ConfigResult<LoadedContent> {
        let path = self.locate()?;
        let content = self
            .locator
            .file_system()
            .read(&path)
            .map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
        Ok(LoadedContent { path, content })
    }

    fn watch_with_cancel(
        &self,
        notify: mpsc::Sender<bool>,
        cancel: CancellationToken,
    ) -> ConfigResult<()> {
        // Resolve before touching the OS watcher so a missing file fails here.
        let path = self.locate()?;
        spawn_watch(self.watchers.as_ref(), path, notify, cancel)
    }
}

/// Serves fixed in-memory content. Cannot be watched.
#[derive(Debug, Clone)]
pub struct MemoryLoader {
    identifier: String,
    content: Vec<u8>,
}

impl MemoryLoader {
    /// The identifier's extension selects the codec, e.g. `"config.json"`.
    pub fn new(identifier: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            identifier: identifier.into(),
            content: content.into(),
        }
    }
}

impl Loader for MemoryLoader {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn load(&self) -> ConfigResult<LoadedContent> {
        Ok(LoadedContent {
            path: PathBuf::from(&self.identifier),
            content: self.content.clone(),
        })
    }

    fn watch_with_cancel(
        &self,
        _notify: mpsc::Sender<bool>,
        _cancel: CancellationToken,
    ) -> ConfigResult<()> {
        Err(ConfigError::WatchUnsupported {
            identifier: self.identifier.clone(),
        })
    }
}
