// src/watch/mock.rs

use std::collections::{HashMap, HashSet, VecDeque};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::anyhow;

use super::backend::{RawEvent, RawEventKind, WatchBackend, WatchHandle};
use crate::errors::Result;

#[derive(Debug, Default)]
struct MockState {
    next_handle: u64,
    watches: HashMap<WatchHandle, PathBuf>,
    pending: VecDeque<RawEvent>,
    failing: HashSet<PathBuf>,
    removed: Vec<WatchHandle>,
}

/// Watch backend driven by hand from tests. Clones share state, so a test
/// keeps one clone to inject events while the manager owns another.
#[derive(Debug, Clone, Default)]
pub struct MockWatchBackend {
    state: Arc<Mutex<MockState>>,
}

impl MockWatchBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future `add` of `path` fail.
    pub fn fail_on(&self, path: impl AsRef<Path>) {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert(path.as_ref().to_path_buf());
    }

    pub fn push(&self, event: RawEvent) {
        self.state.lock().unwrap().pending.push_back(event);
    }

    /// Queue an event for `path`, reported on the watch of its parent.
    ///
    /// Panics if the parent is not watched; use [`push`](Self::push) with a
    /// made-up handle to simulate stale events.
    pub fn push_path(&self, kind: RawEventKind, path: impl AsRef<Path>, is_dir: bool) {
        let path = path.as_ref();
        let parent = path.parent().expect("event path has a parent");
        let handle = self
            .handle_for(parent)
            .unwrap_or_else(|| panic!("parent {parent:?} is not watched"));
        let name = path.file_name().map(OsString::from);
        self.push(RawEvent::new(handle, kind, name, is_dir));
    }

    /// Queue a `SelfDeleted` event for the watched directory `path`.
    pub fn push_self_deleted(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let handle = self
            .handle_for(path)
            .unwrap_or_else(|| panic!("{path:?} is not watched"));
        self.push(RawEvent::new(handle, RawEventKind::SelfDeleted, None, true));
    }

    pub fn handle_for(&self, path: impl AsRef<Path>) -> Option<WatchHandle> {
        let state = self.state.lock().unwrap();
        state
            .watches
            .iter()
            .find(|(_, p)| p.as_path() == path.as_ref())
            .map(|(h, _)| *h)
    }

    /// Currently watched paths, sorted.
    pub fn watched_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<_> = self.state.lock().unwrap().watches.values().cloned().collect();
        paths.sort();
        paths
    }

    /// Every handle passed to `remove`, in call order.
    pub fn removed(&self) -> Vec<WatchHandle> {
        self.state.lock().unwrap().removed.clone()
    }
}

impl WatchBackend for MockWatchBackend {
    fn add(&mut self, dir: &Path) -> Result<WatchHandle> {
        let mut state = self.state.lock().unwrap();
        if state.failing.contains(dir) {
            return Err(anyhow!("simulated watch failure for {dir:?}").into());
        }
        state.next_handle += 1;
        let handle = WatchHandle(state.next_handle);
        state.watches.insert(handle, dir.to_path_buf());
        Ok(handle)
    }

    fn remove(&mut self, handle: WatchHandle) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.removed.push(handle);
        match state.watches.remove(&handle) {
            Some(_) => Ok(()),
            None => Err(anyhow!("unknown watch handle {handle}").into()),
        }
    }

    fn read_events(&mut self) -> Result<Vec<RawEvent>> {
        Ok(self.state.lock().unwrap().pending.drain(..).collect())
    }
}
