//! Filesystem capability used by the locator and loaders.

use std::io;
use std::path::Path;

/// Minimal filesystem access needed to locate and read configuration files.
pub trait FileSystem: Send + Sync {
    /// Check whether a regular file exists at `path`.
    ///
    /// Absence is `Ok(false)`. Any other failure (permission denied, I/O
    /// error) is returned as `Err` and means "exists, but could not check".
    fn file_exists(&self, path: &Path) -> io::Result<bool>;

    /// Read the whole file.
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// The real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn file_exists(&self, path: &Path) -> io::Result<bool> {
        match std::fs::metadata(path) {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(err) if is_absent(&err) => Ok(false),
            Err(err) => Err(err),
        }
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

fn is_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}
