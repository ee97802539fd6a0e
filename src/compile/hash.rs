// src/compile/hash.rs

use std::path::Path;

use blake3::Hasher;
use tracing::debug;

use crate::fs::FileSystem;

/// Hex-encoded blake3 hash of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(bytes);
    hasher.finalize().to_hex().to_string()
}

/// Hash of the file at `path`, or `None` if it cannot be read.
pub fn file_hash(fs: &dyn FileSystem, path: &Path) -> Option<String> {
    match fs.read(path) {
        Ok(bytes) => Some(content_hash(&bytes)),
        Err(err) => {
            debug!(?path, error = %format!("{err:#}"), "no existing output to hash");
            None
        }
    }
}

/// Whether the file at `path` already holds exactly `bytes`.
pub fn is_unchanged(fs: &dyn FileSystem, path: &Path, bytes: &[u8]) -> bool {
    file_hash(fs, path).is_some_and(|existing| existing == content_hash(bytes))
}
