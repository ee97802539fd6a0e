// src/watch/backend.rs

//! The seam between the watch manager and the OS notification facility.

use std::ffi::OsString;
use std::fmt;
use std::path::Path;

use crate::errors::Result;

/// Opaque identifier the backend assigns to one watched directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WatchHandle(pub u64);

impl fmt::Display for WatchHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEventKind {
    Created,
    MovedIn,
    Deleted,
    MovedOut,
    /// The watched directory itself went away.
    SelfDeleted,
    /// A file opened for writing was closed.
    ContentWritten,
}

/// One notification, relative to the watched directory it was reported on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub handle: WatchHandle,
    pub kind: RawEventKind,
    /// Entry name inside the watched directory; `None` for events about the
    /// directory itself.
    pub name: Option<OsString>,
    pub is_dir: bool,
}

impl RawEvent {
    pub fn new(
        handle: WatchHandle,
        kind: RawEventKind,
        name: Option<OsString>,
        is_dir: bool,
    ) -> Self {
        Self {
            handle,
            kind,
            name,
            is_dir,
        }
    }
}

/// A per-directory, non-recursive change notification source.
pub trait WatchBackend {
    /// Start watching `dir` (not its subdirectories).
    fn add(&mut self, dir: &Path) -> Result<WatchHandle>;

    /// Stop watching. Removing a handle the OS already dropped may fail.
    fn remove(&mut self, handle: WatchHandle) -> Result<()>;

    /// Pending events, oldest first. Never blocks; may be empty.
    fn read_events(&mut self) -> Result<Vec<RawEvent>>;
}
