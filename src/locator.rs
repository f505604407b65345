//! Resolve an identifier to a concrete configuration file.
//!
//! Search order is directory-major: every extension is tried in one
//! directory before moving on to the next, so `./config.json` wins over
//! `/etc/config` even though the latter is an exact name match.

use crate::codec::CodecRegistry;
use crate::error::{ConfigError, ConfigResult};
use crate::fs::FileSystem;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

/// Finds configuration files across search directories and codec extensions.
#[derive(Clone)]
pub struct Locator {
    search_paths: Arc<[PathBuf]>,
    codecs: Arc<CodecRegistry>,
    file_system: Arc<dyn FileSystem>,
}

impl Locator {
    pub fn new(
        search_paths: Arc<[PathBuf]>,
        codecs: Arc<CodecRegistry>,
        file_system: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            search_paths,
            codecs,
            file_system,
        }
    }

    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.file_system
    }

    /// Resolve `identifier` to the first existing file.
    ///
    /// - Absolute identifiers are checked as-is, then with each registered
    ///   extension appended.
    /// - Other identifiers are joined to each search directory in order; each
    ///   directory tries the bare name, then every extension.
    ///
    /// A stat failure other than absence aborts the search with
    /// [`ConfigError::Stat`].
    pub fn locate(&self, identifier: &str) -> ConfigResult<PathBuf> {
        let requested = Path::new(identifier);

        let found = if requested.is_absolute() {
            self.probe(requested)?
        } else {
            let mut found = None;
            for directory in self.search_paths.iter() {
                found = self.probe(&directory.join(requested))?;
                if found.is_some() {
                    break;
                }
            }
            found
        };

        match found {
            Some(path) => {
                debug!(identifier, path = %path.display(), "Resolved configuration");
                Ok(path)
            }
            None => Err(ConfigError::not_found(identifier)),
        }
    }

    /// Check `base` as-is, then with each registered extension appended.
    fn probe(&self, base: &Path) -> ConfigResult<Option<PathBuf>> {
        if self.exists(base)? {
            return Ok(Some(base.to_path_buf()));
        }

        for extension in self.codecs.extensions() {
            let candidate = with_suffix(base, extension);
            if self.exists(&candidate)? {
                return Ok(Some(candidate));
            }
        }

        Ok(None)
    }

    fn exists(&self, path: &Path) -> ConfigResult<bool> {
        trace!(path = %path.display(), "Checking candidate");
        self.file_system
            .file_exists(path)
            .map_err(|source| ConfigError::Stat {
                path: path.to_path_buf(),
                source,
            })
    }
}

/// Append a raw suffix (`config` + `.yaml`), unlike `Path::with_extension`
/// which would replace an existing one.
fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = base.as_os_str().to_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}
