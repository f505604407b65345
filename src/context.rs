//! Capabilities shared by locators, loaders and configurations.

use crate::codec::CodecRegistry;
use crate::fs::{FileSystem, OsFileSystem};
use crate::loader::watcher::{NotifyWatcherFactory, WatcherFactory};
use crate::locator::Locator;
use crate::paths::standard_paths;
use std::path::PathBuf;
use std::sync::Arc;

/// Search paths, codecs, filesystem and watcher backend used for loading.
///
/// Cloning is cheap; every capability is reference counted.
#[derive(Clone)]
pub struct LoadContext {
    search_paths: Arc<[PathBuf]>,
    codecs: Arc<CodecRegistry>,
    file_system: Arc<dyn FileSystem>,
    watchers: Arc<dyn WatcherFactory>,
}

impl Default for LoadContext {
    fn default() -> Self {
        Self {
            search_paths: standard_paths().into(),
            codecs: Arc::new(CodecRegistry::with_defaults()),
            file_system: Arc::new(OsFileSystem),
            watchers: Arc::new(NotifyWatcherFactory),
        }
    }
}

impl std::fmt::Debug for LoadContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadContext")
            .field("search_paths", &self.search_paths)
            .field("codecs", &self.codecs)
            .finish_non_exhaustive()
    }
}

impl LoadContext {
    /// Replace the directories searched for bare identifiers.
    pub fn with_search_paths(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.search_paths = paths.into_iter().collect();
        self
    }

    pub fn with_codecs(mut self, codecs: CodecRegistry) -> Self {
        self.codecs = Arc::new(codecs);
        self
    }

    pub fn with_file_system(mut self, file_system: Arc<dyn FileSystem>) -> Self {
        self.file_system = file_system;
        self
    }

    pub fn with_watcher_factory(mut self, watchers: Arc<dyn WatcherFactory>) -> Self {
        self.watchers = watchers;
        self
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    pub fn codecs(&self) -> &CodecRegistry {
        &self.codecs
    }

    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.file_system
    }

    pub fn watchers(&self) -> &Arc<dyn WatcherFactory> {
        &self.watchers
    }

    /// A locator over this context's search paths and codec extensions.
    pub fn locator(&self) -> Locator {
        Locator::new(
            Arc::clone(&self.search_paths),
            Arc::clone(&self.codecs),
            Arc::clone(&self.file_system),
        )
    }
}
