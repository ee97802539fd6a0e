#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use configd::fs::mock::MockFileSystem;
use configd::fs::FileSystem;
use configd::watch::{MockWatchBackend, WatchManager};

pub use configd_test_utils::builders::ConfigFileBuilder;
pub use configd_test_utils::fixtures;
pub use configd_test_utils::recording::{Change, RecordingHandler};
pub use configd_test_utils::{init_tracing, with_timeout};

pub const SOURCE: &str = "/srv/configd";
pub const ACTIVE: &str = "/srv/active";

/// Mock filesystem with empty source and active roots.
pub fn mock_roots() -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_dir(SOURCE);
    fs.add_dir(ACTIVE);
    fs
}

pub fn shared(fs: &MockFileSystem) -> Arc<dyn FileSystem> {
    Arc::new(fs.clone())
}

/// Watch manager over `fs` plus a handle on its backend for injecting events.
pub fn mock_manager(fs: &MockFileSystem) -> (WatchManager<MockWatchBackend>, MockWatchBackend) {
    let backend = MockWatchBackend::new();
    let manager = WatchManager::new(backend.clone(), shared(fs));
    (manager, backend)
}

pub fn read_string(fs: &MockFileSystem, path: impl AsRef<Path>) -> Option<String> {
    fs.contents(path)
        .map(|bytes| String::from_utf8(bytes).expect("output is UTF-8"))
}
