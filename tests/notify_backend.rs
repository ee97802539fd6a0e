//! The `notify` backend against a real directory. Linux only, where inotify
//! reports close-after-write.
#![cfg(target_os = "linux")]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use configd::engine::Dispatcher;
use configd::fs::RealFileSystem;
use configd::watch::{NotifyBackend, WatchManager};
use tempfile::TempDir;

mod common;
use crate::common::{init_tracing, Change, RecordingHandler};

type RealDispatcher = Dispatcher<NotifyBackend, RecordingHandler>;

fn start(root: &Path) -> (RealDispatcher, RecordingHandler) {
    let backend = NotifyBackend::new().unwrap();
    let manager = WatchManager::new(backend, Arc::new(RealFileSystem));
    let handler = RecordingHandler::new();
    let mut dispatcher = Dispatcher::new(manager, handler.clone());
    dispatcher.watch_root(root, false);
    (dispatcher, handler)
}

/// Poll until `done` holds or five seconds pass.
fn poll_until(dispatcher: &mut RealDispatcher, mut done: impl FnMut(&RealDispatcher) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        dispatcher.poll().unwrap();
        if done(dispatcher) {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    false
}

#[test]
fn file_writes_and_deletes_are_reported() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let (mut dispatcher, handler) = start(&root);
    let file = root.join("app.yml");

    fs::write(&file, "k: v\n").unwrap();
    assert!(
        poll_until(&mut dispatcher, |_| handler.updated().contains(&file)),
        "no update for {file:?}: {:?}",
        handler.changes()
    );

    fs::remove_file(&file).unwrap();
    assert!(
        poll_until(&mut dispatcher, |_| handler.changes().contains(&Change::Deleted(file.clone()))),
        "no delete for {file:?}: {:?}",
        handler.changes()
    );
}

#[test]
fn new_subdirectories_are_followed() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().canonicalize().unwrap();
    let (mut dispatcher, handler) = start(&root);
    let sub = root.join("sub");

    fs::create_dir(&sub).unwrap();
    assert!(poll_until(&mut dispatcher, |d| d.watches().is_watched(&sub)));

    let file = sub.join("inner.xslt");
    fs::write(&file, "<x/>").unwrap();
    assert!(
        poll_until(&mut dispatcher, |_| handler.updated().contains(&file)),
        "no update for {file:?}: {:?}",
        handler.changes()
    );
}

#[test]
fn removed_subdirectories_are_unwatched() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("gone/deeper")).unwrap();
    let (mut dispatcher, _handler) = start(&root);
    assert!(dispatcher.watches().is_watched(&root.join("gone/deeper")));

    fs::remove_dir_all(root.join("gone")).unwrap();
    assert!(poll_until(&mut dispatcher, |d| {
        !d.watches().is_watched(&root.join("gone")) && !d.watches().is_watched(&root.join("gone/deeper"))
    }));
    assert!(dispatcher.watches().is_watched(&root));
}

#[test]
fn renamed_subdirectories_move_their_watches() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("a/inner")).unwrap();
    let (mut dispatcher, handler) = start(&root);

    fs::rename(root.join("a"), root.join("a2")).unwrap();
    assert!(
        poll_until(&mut dispatcher, |d| d.watches().paths()
            == vec![root.clone(), root.join("a2"), root.join("a2/inner")]),
        "watches after rename: {:?}",
        dispatcher.watches().paths()
    );

    let file = root.join("a2/inner/f.yml");
    fs::write(&file, "k: v\n").unwrap();
    assert!(
        poll_until(&mut dispatcher, |_| handler.updated().contains(&file)),
        "no update for {file:?}: {:?}",
        handler.changes()
    );
}
