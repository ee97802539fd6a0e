// src/watch/manager.rs

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use super::backend::{RawEvent, WatchBackend, WatchHandle};
use crate::errors::Result;
use crate::fs::FileSystem;

/// What `add_watch` found below the directory it was given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Directories newly registered, parents before children.
    pub directories: Vec<PathBuf>,
    /// Regular files seen in the walked directories, sorted.
    pub files: Vec<PathBuf>,
}

/// Keeps one watch per directory of a subtree and maps backend handles back
/// to absolute paths.
pub struct WatchManager<B: WatchBackend> {
    backend: B,
    fs: Arc<dyn FileSystem>,
    by_handle: HashMap<WatchHandle, PathBuf>,
    by_path: HashMap<PathBuf, WatchHandle>,
}

impl<B: WatchBackend> fmt::Debug for WatchManager<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchManager")
            .field("watches", &self.by_handle.len())
            .finish_non_exhaustive()
    }
}

impl<B: WatchBackend> WatchManager<B> {
    pub fn new(backend: B, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            backend,
            fs,
            by_handle: HashMap::new(),
            by_path: HashMap::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Watch `root` and every directory below it.
    ///
    /// The walk uses an explicit worklist and remembers canonical paths, so
    /// symlink loops are visited once. Directories that cannot be read or
    /// watched are logged and skipped together with their subtree; the rest
    /// of the walk continues. A `root` that is not a directory is a no-op.
    pub fn add_watch(&mut self, root: &Path) -> Discovery {
        let mut discovery = Discovery::default();
        if !self.fs.is_dir(root) {
            debug!(path = ?root, "not a directory; nothing to watch");
            return discovery;
        }

        let mut visited = HashSet::new();
        let mut worklist = vec![root.to_path_buf()];

        while let Some(dir) = worklist.pop() {
            let canonical = match self.fs.canonicalize(&dir) {
                Ok(path) => path,
                Err(err) => {
                    warn!(path = ?dir, error = %format!("{err:#}"), "cannot resolve directory; skipping");
                    continue;
                }
            };
            if !visited.insert(canonical) {
                trace!(path = ?dir, "directory already visited in this walk");
                continue;
            }
            if self.by_path.contains_key(&dir) {
                trace!(path = ?dir, "directory already watched");
                continue;
            }

            match self.backend.add(&dir) {
                Ok(handle) => {
                    info!(path = ?dir, %handle, "watching directory");
                    self.by_handle.insert(handle, dir.clone());
                    self.by_path.insert(dir.clone(), handle);
                    discovery.directories.push(dir.clone());
                }
                Err(err) => {
                    warn!(path = ?dir, error = %err, "failed to watch directory; subtree left unwatched");
                    continue;
                }
            }

            let entries = match self.fs.read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = ?dir, error = %format!("{err:#}"), "cannot list directory");
                    continue;
                }
            };

            let mut subdirs = Vec::new();
            for entry in entries {
                if self.fs.is_dir(&entry) {
                    subdirs.push(entry);
                } else {
                    discovery.files.push(entry);
                }
            }
            // Pop in name order.
            subdirs.sort_by(|a, b| b.cmp(a));
            worklist.extend(subdirs);
        }

        discovery.files.sort();
        discovery
    }

    /// Stop watching `path` and every watched directory below it.
    /// Returns how many watches were dropped.
    pub fn remove_watch(&mut self, path: &Path) -> usize {
        let mut doomed: Vec<(PathBuf, WatchHandle)> = self
            .by_path
            .iter()
            .filter(|(watched, _)| watched.starts_with(path))
            .map(|(watched, handle)| (watched.clone(), *handle))
            .collect();
        // Children first.
        doomed.sort_by(|a, b| b.0.cmp(&a.0));

        for (watched, handle) in &doomed {
            self.by_path.remove(watched);
            self.by_handle.remove(handle);
            if let Err(err) = self.backend.remove(*handle) {
                // The kernel drops watches of deleted directories on its own.
                debug!(path = ?watched, %handle, error = %err, "backend watch removal failed");
            }
            info!(path = ?watched, %handle, "stopped watching directory");
        }

        doomed.len()
    }

    pub fn resolve(&self, handle: WatchHandle) -> Option<&Path> {
        self.by_handle.get(&handle).map(PathBuf::as_path)
    }

    pub fn handle_of(&self, path: &Path) -> Option<WatchHandle> {
        self.by_path.get(path).copied()
    }

    pub fn is_watched(&self, path: &Path) -> bool {
        self.by_path.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.by_handle.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_handle.is_empty()
    }

    /// Watched directories, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.by_path.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Pending backend events; never blocks.
    pub fn poll_events(&mut self) -> Result<Vec<RawEvent>> {
        self.backend.read_events()
    }
}
