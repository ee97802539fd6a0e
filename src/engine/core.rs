// src/engine/core.rs

//! Pure event classification.
//!
//! Decides what a raw watch event means for the daemon without touching the
//! filesystem, the watch backend or the change handler, so the routing table
//! can be tested on its own.

use crate::watch::RawEventKind;

/// What the dispatcher should do with one raw event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// A directory appeared: watch it and everything below it.
    AddWatch,
    /// A directory went away: drop its watch and all watches below it.
    RemoveWatch,
    /// A file was created, moved in or rewritten.
    Updated,
    /// A file was deleted or moved out.
    Deleted,
    Ignore,
}

pub fn classify(kind: RawEventKind, is_dir: bool) -> Route {
    use RawEventKind::*;

    match (kind, is_dir) {
        (Created | MovedIn, true) => Route::AddWatch,
        (Created | MovedIn, false) => Route::Updated,
        (Deleted | MovedOut, true) | (SelfDeleted, _) => Route::RemoveWatch,
        (Deleted | MovedOut, false) => Route::Deleted,
        (ContentWritten, false) => Route::Updated,
        (ContentWritten, true) => Route::Ignore,
    }
}
