use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use configd::engine::ChangeHandler;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Updated(PathBuf),
    Deleted(PathBuf),
}

/// A fake change handler that records every callback, in order.
///
/// Clones share the log, so a test can keep one while the dispatcher owns
/// the other.
#[derive(Debug, Clone, Default)]
pub struct RecordingHandler {
    changes: Arc<Mutex<Vec<Change>>>,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn changes(&self) -> Vec<Change> {
        self.changes.lock().unwrap().clone()
    }

    /// Return and clear everything recorded so far.
    pub fn take(&self) -> Vec<Change> {
        std::mem::take(&mut *self.changes.lock().unwrap())
    }

    pub fn updated(&self) -> Vec<PathBuf> {
        self.changes()
            .into_iter()
            .filter_map(|c| match c {
                Change::Updated(p) => Some(p),
                Change::Deleted(_) => None,
            })
            .collect()
    }
}

impl ChangeHandler for RecordingHandler {
    fn on_updated(&mut self, path: &Path) {
        self.changes
            .lock()
            .unwrap()
            .push(Change::Updated(path.to_path_buf()));
    }

    fn on_deleted(&mut self, path: &Path) {
        self.changes
            .lock()
            .unwrap()
            .push(Change::Deleted(path.to_path_buf()));
    }
}
