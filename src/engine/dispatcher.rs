// src/engine/dispatcher.rs

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{debug, info, trace};

use super::core::{classify, Route};
use crate::errors::Result;
use crate::watch::{RawEvent, WatchBackend, WatchManager};

/// Receives file-level changes from the dispatcher.
pub trait ChangeHandler {
    /// A file was created, moved in or rewritten.
    fn on_updated(&mut self, path: &Path);

    /// A file was deleted or moved out.
    fn on_deleted(&mut self, path: &Path);
}

/// Daemon state: the watch table plus the change handler, driven one batch
/// of events at a time.
pub struct Dispatcher<B: WatchBackend, H: ChangeHandler> {
    watches: WatchManager<B>,
    handler: H,
}

impl<B: WatchBackend, H: ChangeHandler> fmt::Debug for Dispatcher<B, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("watches", &self.watches)
            .finish_non_exhaustive()
    }
}

impl<B: WatchBackend, H: ChangeHandler> Dispatcher<B, H> {
    pub fn new(watches: WatchManager<B>, handler: H) -> Self {
        Self { watches, handler }
    }

    pub fn watches(&self) -> &WatchManager<B> {
        &self.watches
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Watch `root` recursively. With `compile_existing`, every file already
    /// present is reported as updated.
    pub fn watch_root(&mut self, root: &Path, compile_existing: bool) {
        let discovery = self.watches.add_watch(root);
        info!(
            root = ?root,
            directories = discovery.directories.len(),
            files = discovery.files.len(),
            "source tree watched"
        );
        if compile_existing {
            for file in &discovery.files {
                self.handler.on_updated(file);
            }
        }
    }

    /// Process whatever events are pending, in arrival order. Never blocks.
    ///
    /// Returns the number of raw events read. Fails only when the watch
    /// backend itself is broken.
    pub fn poll(&mut self) -> Result<usize> {
        let events = self.watches.poll_events()?;
        let count = events.len();
        for event in events {
            self.dispatch(event);
        }
        Ok(count)
    }

    fn dispatch(&mut self, event: RawEvent) {
        let Some(path) = self.event_path(&event) else {
            debug!(handle = %event.handle, kind = ?event.kind, "dropping event for stale watch handle");
            return;
        };

        let route = classify(event.kind, event.is_dir);
        trace!(?path, kind = ?event.kind, is_dir = event.is_dir, ?route, "dispatching event");

        match route {
            Route::AddWatch => {
                // Anything moved in together with the directory has produced
                // no events of its own.
                let discovery = self.watches.add_watch(&path);
                for file in &discovery.files {
                    self.handler.on_updated(file);
                }
            }
            Route::RemoveWatch => {
                self.watches.remove_watch(&path);
            }
            Route::Updated => self.handler.on_updated(&path),
            Route::Deleted => self.handler.on_deleted(&path),
            Route::Ignore => {}
        }
    }

    fn event_path(&self, event: &RawEvent) -> Option<PathBuf> {
        let dir = self.watches.resolve(event.handle)?;
        Some(match &event.name {
            Some(name) => dir.join(name),
            None => dir.to_path_buf(),
        })
    }
}
