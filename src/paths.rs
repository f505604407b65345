//! Standard configuration search paths.
//!
//! The search list is computed once per process from:
//! - The current directory (`.`)
//! - The process working directory, with a trailing `bin` segment stripped
//! - `XDG_CONFIG_DIRS` (platform path-list separator)
//! - A fixed set of OS-specific system directories
//!
//! Every candidate also contributes its `etc` subdirectory. The list is
//! deduplicated and keeps first-discovered order.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// Environment variable holding additional search directories.
pub const CONFIG_DIRS_ENV: &str = "XDG_CONFIG_DIRS";

static STANDARD_PATHS: LazyLock<Vec<PathBuf>> = LazyLock::new(|| {
    // The working directory is a startup invariant; there is nothing sensible
    // to search without it.
    let working_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(err) => panic!("could not determine the current working directory: {err}"),
    };

    let overrides = std::env::var_os(CONFIG_DIRS_ENV)
        .map(|value| std::env::split_paths(&value).collect::<Vec<_>>())
        .unwrap_or_default();

    collect_search_paths(&working_dir, &overrides, &system_paths())
});

/// Returns the ordered standard search directories.
///
/// The returned vector is a fresh copy; mutating it does not affect later calls.
pub fn standard_paths() -> Vec<PathBuf> {
    STANDARD_PATHS.clone()
}

/// Build the deduplicated search list from its inputs.
pub fn collect_search_paths(
    working_dir: &Path,
    overrides: &[PathBuf],
    system: &[PathBuf],
) -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from("."), strip_bin_suffix(working_dir)];
    candidates.extend(overrides.iter().filter(|p| !p.as_os_str().is_empty()).cloned());
    candidates.extend(system.iter().cloned());

    let mut paths: Vec<PathBuf> = Vec::new();
    let mut push = |path: PathBuf| {
        if !paths.contains(&path) {
            paths.push(path);
        }
    };

    for candidate in candidates {
        let etc = candidate.join("etc");
        // The filesystem root only contributes /etc.
        if candidate.parent().is_some() {
            push(candidate);
        }
        push(etc);
    }

    paths
}

/// Strip a trailing `bin` component so binaries installed under `<prefix>/bin`
/// search `<prefix>` instead.
fn strip_bin_suffix(dir: &Path) -> PathBuf {
    match (dir.file_name(), dir.parent()) {
        (Some(name), Some(parent)) if name == "bin" => parent.to_path_buf(),
        _ => dir.to_path_buf(),
    }
}

#[cfg(target_os = "windows")]
fn system_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    paths.extend(dirs::config_dir());
    paths.extend(dirs::data_local_dir());
    paths.extend(dirs::home_dir());
    if let Some(program_data) = std::env::var_os("ProgramData") {
        paths.push(PathBuf::from(program_data));
    }
    paths
}

#[cfg(target_os = "macos")]
fn system_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    paths.extend(dirs::config_dir());
    paths.extend(dirs::preference_dir());
    paths.extend(dirs::home_dir());
    paths.extend(
        ["/Library/Preferences", "/usr/local", "/usr", "/"]
            .into_iter()
            .map(PathBuf::from),
    );
    paths
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn system_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    paths.extend(dirs::config_dir());
    paths.extend(dirs::home_dir());
    paths.extend(
        ["/usr/local", "/usr", "/opt", "/"]
            .into_iter()
            .map(PathBuf::from),
    );
    paths
}
