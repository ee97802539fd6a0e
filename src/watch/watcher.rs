// src/watch/watcher.rs

use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};

use notify::event::{AccessKind, AccessMode, CreateKind, EventKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{trace, warn};

use super::backend::{RawEvent, RawEventKind, WatchBackend, WatchHandle};
use crate::errors::{ConfigdError, Result};

/// Production [`WatchBackend`] on top of `notify`.
///
/// One `RecommendedWatcher` holds every directory, each registered
/// non-recursively. notify reports absolute paths; they are translated back
/// into (parent handle, entry name) pairs so the manager sees the same
/// per-directory events on every platform.
pub struct NotifyBackend {
    watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    next_handle: u64,
    by_handle: HashMap<WatchHandle, PathBuf>,
    by_path: HashMap<PathBuf, WatchHandle>,
}

impl fmt::Debug for NotifyBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyBackend")
            .field("watches", &self.by_handle.len())
            .finish_non_exhaustive()
    }
}

impl NotifyBackend {
    pub fn new() -> Result<Self> {
        // notify calls the sender from its own thread; the receiving end is
        // drained without blocking in `read_events`.
        let (tx, rx) = mpsc::channel::<notify::Result<Event>>();
        let watcher = RecommendedWatcher::new(tx, Config::default())?;
        Ok(Self {
            watcher,
            rx,
            next_handle: 0,
            by_handle: HashMap::new(),
            by_path: HashMap::new(),
        })
    }

    fn translate(&self, event: Event) -> Vec<RawEvent> {
        use RawEventKind::*;

        let (kind, dir_hint) = match event.kind {
            EventKind::Create(CreateKind::Folder) => (Created, Some(true)),
            EventKind::Create(CreateKind::File) => (Created, Some(false)),
            EventKind::Create(_) => (Created, None),
            EventKind::Remove(RemoveKind::Folder) => (Deleted, Some(true)),
            EventKind::Remove(RemoveKind::File) => (Deleted, Some(false)),
            EventKind::Remove(_) => (Deleted, None),
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => (MovedOut, None),
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => (MovedIn, None),
            EventKind::Access(AccessKind::Close(AccessMode::Write)) => (ContentWritten, Some(false)),
            // No close-after-write notifications outside inotify.
            #[cfg(not(target_os = "linux"))]
            EventKind::Modify(ModifyKind::Data(_)) => (ContentWritten, Some(false)),
            _ => {
                trace!(kind = ?event.kind, paths = ?event.paths, "ignoring notify event");
                return Vec::new();
            }
        };

        event
            .paths
            .iter()
            .filter_map(|path| self.translate_path(kind, dir_hint, path))
            .collect()
    }

    fn translate_path(
        &self,
        kind: RawEventKind,
        dir_hint: Option<bool>,
        path: &Path,
    ) -> Option<RawEvent> {
        let parent_handle = path.parent().and_then(|p| self.by_path.get(p)).copied();

        if kind == RawEventKind::Deleted && parent_handle.is_none() {
            if let Some(own) = self.by_path.get(path) {
                return Some(RawEvent::new(*own, RawEventKind::SelfDeleted, None, true));
            }
        }

        let Some(handle) = parent_handle else {
            trace!(?path, "dropping event outside watched directories");
            return None;
        };

        let is_dir = dir_hint.unwrap_or_else(|| match kind {
            RawEventKind::Deleted | RawEventKind::MovedOut => self.by_path.contains_key(path),
            _ => path.is_dir(),
        });

        Some(RawEvent::new(
            handle,
            kind,
            path.file_name().map(OsString::from),
            is_dir,
        ))
    }
}

impl WatchBackend for NotifyBackend {
    fn add(&mut self, dir: &Path) -> Result<WatchHandle> {
        if let Some(handle) = self.by_path.get(dir) {
            return Ok(*handle);
        }
        self.watcher.watch(dir, RecursiveMode::NonRecursive)?;
        self.next_handle += 1;
        let handle = WatchHandle(self.next_handle);
        self.by_handle.insert(handle, dir.to_path_buf());
        self.by_path.insert(dir.to_path_buf(), handle);
        Ok(handle)
    }

    fn remove(&mut self, handle: WatchHandle) -> Result<()> {
        let path = self.by_handle.remove(&handle).ok_or_else(|| {
            ConfigdError::Other(anyhow::anyhow!("unknown watch handle {handle}"))
        })?;
        self.by_path.remove(&path);
        self.watcher.unwatch(&path)?;
        Ok(())
    }

    fn read_events(&mut self) -> Result<Vec<RawEvent>> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(Ok(event)) => events.extend(self.translate(event)),
                Ok(Err(err)) => warn!(error = %err, "file watch error"),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Err(ConfigdError::WatchDisconnected),
            }
        }
        Ok(events)
    }
}
