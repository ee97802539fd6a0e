// src/watch/path_utils.rs

//! Utility functions for path handling in the watch layer.

use std::path::{Path, PathBuf};

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Returns `None` if `path` does not live under `root`. Both paths are
/// expected to be absolute and already canonical; no filesystem access is
/// performed, so this also works for paths that were just deleted.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    Some(rel.to_string_lossy().replace('\\', "/"))
}

/// `path` with `old_suffix` stripped from its base name and `new_suffix`
/// appended. The caller has already checked that the suffix matches (in any
/// ASCII case), so only its length is used.
pub fn replace_suffix(path: &Path, old_suffix: &str, new_suffix: &str) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    let stem = name.get(..name.len().checked_sub(old_suffix.len())?)?;
    Some(path.with_file_name(format!("{stem}{new_suffix}")))
}

/// ASCII case-insensitive `ends_with`.
pub fn has_suffix_ignore_case(name: &str, suffix: &str) -> bool {
    name.len() >= suffix.len()
        && name
            .get(name.len() - suffix.len()..)
            .is_some_and(|tail| tail.eq_ignore_ascii_case(suffix))
}
