use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::env::Environment;
use crate::errors::{Error, Result};

/// Resolve `name` to an executable using the search path of `env`.
///
/// Fails with [`Error::CommandNotFound`] when nothing executable is found.
/// A missing `PATH` only leaves names with a path separator resolvable.
pub fn resolve(env: &Environment, name: &str) -> Result<PathBuf> {
    let search_paths = env.search_path().unwrap_or_default();
    match find_command_path(search_paths, Path::new(name)) {
        Some(found) => {
            debug!(command = name, path = %found.display(), "resolved command");
            Ok(found.into_owned())
        }
        None => {
            debug!(command = name, "command not found on search path");
            Err(Error::not_found(name))
        }
    }
}

/// Resolve a command path the way a typical shell would.
///
/// Behavior:
/// - Absolute path: returns it if it is an executable file.
/// - Relative with multiple components (e.g., `bin/sh`): returns it if it is an executable file.
/// - `./foo` on Unix or any `./`-prefixed path on other platforms: returns it if it is an executable file.
/// - Single path component (no separators): search each directory in `search_paths` (PATH)
///   and return the first executable match. Empty entries are skipped.
/// - Empty path: returns `None`.
///
/// Returns either a borrowed reference to the provided `path` or an owned `PathBuf`
/// when the result is discovered via PATH lookup.
pub fn find_command_path<'a>(search_paths: &OsStr, path: &'a Path) -> Option<Cow<'a, Path>> {
    // `components()` drops a trailing separator, so "true/" would otherwise
    // be looked up as "true". A name ending in a separator is a directory.
    if path
        .to_string_lossy()
        .ends_with(std::path::is_separator)
    {
        return None;
    }

    if path.is_absolute() {
        return find_by_path(path).map(Cow::Borrowed);
    }

    let search_in_current_dir = cfg!(not(unix)) || path.starts_with("./");
    if search_in_current_dir && is_executable(path) {
        return Some(Cow::Borrowed(path));
    }

    let mut components = path.components();
    let first = components.next();
    let second = components.next();
    match (first, second) {
        (None, None) => {
            // Empty path -> not found
            None
        }
        (Some(x), None) => {
            // Single component -> search in PATH
            find_in_path(search_paths, x.as_os_str()).map(Cow::Owned)
        }
        _ => {
            // Multiple components -> search in current dir
            find_by_path(path).map(Cow::Borrowed)
        }
    }
}

fn find_in_path(search_paths: &OsStr, cmd: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search_paths)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(cmd))
        .find(|candidate| is_executable(candidate))
}

fn find_by_path(path: &Path) -> Option<&Path> {
    if is_executable(path) { Some(path) } else { None }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    match path.metadata() {
        Ok(meta) => meta.is_file() && meta.permissions().mode() & 0o111 != 0,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
