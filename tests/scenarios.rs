//! End-to-end behaviour of the wired-up daemon on a mock filesystem and a
//! hand-driven watch backend.

use std::path::{Path, PathBuf};

use configd::fs::mock::MockFileSystem;
use configd::watch::{MockWatchBackend, RawEventKind};
use configd::{build_dispatcher, DaemonDispatcher};

mod common;
use crate::common::fixtures::{KEY_VALUE_TEMPLATE, SIMPLE_DEFINITION};
use crate::common::{init_tracing, mock_roots, read_string, shared, ConfigFileBuilder, ACTIVE, SOURCE};

fn src(rel: &str) -> PathBuf {
    Path::new(SOURCE).join(rel)
}

fn out(rel: &str) -> PathBuf {
    Path::new(ACTIVE).join(rel)
}

struct Daemon {
    fs: MockFileSystem,
    backend: MockWatchBackend,
    dispatcher: DaemonDispatcher<MockWatchBackend>,
}

impl Daemon {
    fn start(fs: MockFileSystem, builder: ConfigFileBuilder) -> Self {
        init_tracing();
        let cfg = builder.roots(SOURCE, ACTIVE).build();
        let backend = MockWatchBackend::new();
        let dispatcher = build_dispatcher(&cfg, shared(&fs), backend.clone()).unwrap();
        Self {
            fs,
            backend,
            dispatcher,
        }
    }

    /// Write a file and deliver the events a kernel would report for it.
    fn write(&mut self, rel: &str, contents: &str) {
        let existed = self.fs.contents(src(rel)).is_some();
        self.fs.add_file(src(rel), contents);
        if !existed {
            self.backend.push_path(RawEventKind::Created, src(rel), false);
        }
        self.backend.push_path(RawEventKind::ContentWritten, src(rel), false);
        self.dispatcher.poll().unwrap();
    }

    fn mkdir(&mut self, rel: &str) {
        self.fs.add_dir(src(rel));
        self.backend.push_path(RawEventKind::Created, src(rel), true);
        self.dispatcher.poll().unwrap();
    }

    fn delete(&mut self, rel: &str) {
        self.fs.remove_tree(src(rel));
        self.backend.push_path(RawEventKind::Deleted, src(rel), false);
        self.dispatcher.poll().unwrap();
    }

    fn rename_dir(&mut self, from: &str, to: &str) {
        self.fs.rename(src(from), src(to));
        self.backend.push_path(RawEventKind::MovedOut, src(from), true);
        self.backend.push_path(RawEventKind::MovedIn, src(to), true);
        self.dispatcher.poll().unwrap();
    }

    fn output(&self, rel: &str) -> Option<String> {
        read_string(&self.fs, out(rel))
    }
}

#[test]
fn new_pair_in_a_new_directory_is_compiled() {
    let mut daemon = Daemon::start(mock_roots(), ConfigFileBuilder::new());

    daemon.mkdir("a");
    daemon.write("a/b.yml", "greeting: hello\n");
    assert_eq!(daemon.output("a/b"), None);

    daemon.write("a/b.xslt", KEY_VALUE_TEMPLATE);
    assert_eq!(daemon.output("a/b").as_deref(), Some("greeting=hello\n"));
}

#[test]
fn editing_either_half_recompiles() {
    let mut daemon = Daemon::start(mock_roots(), ConfigFileBuilder::new());
    daemon.write("svc.xslt", KEY_VALUE_TEMPLATE);
    daemon.write("svc.yml", SIMPLE_DEFINITION);
    assert_eq!(daemon.output("svc").as_deref(), Some("port=80\nhost=example.org\n"));

    daemon.write("svc.yml", "port: \"8080\"\n");
    assert_eq!(daemon.output("svc").as_deref(), Some("port=8080\n"));
}

#[test]
fn deleting_a_half_removes_the_output_once() {
    let mut daemon = Daemon::start(mock_roots(), ConfigFileBuilder::new());
    daemon.write("x.yml", SIMPLE_DEFINITION);
    daemon.write("x.xslt", KEY_VALUE_TEMPLATE);
    assert!(daemon.output("x").is_some());

    daemon.delete("x.yml");
    assert_eq!(daemon.output("x"), None);

    daemon.delete("x.xslt");
    assert_eq!(daemon.output("x"), None);
}

#[test]
fn renamed_directories_move_their_watches() {
    let fs = mock_roots();
    fs.add_dir(src("a/inner"));
    let mut daemon = Daemon::start(fs, ConfigFileBuilder::new());
    assert!(daemon.dispatcher.watches().is_watched(&src("a/inner")));

    daemon.rename_dir("a", "a2");

    let watches = daemon.dispatcher.watches();
    assert!(!watches.is_watched(&src("a")));
    assert!(!watches.is_watched(&src("a/inner")));
    assert!(watches.is_watched(&src("a2")));
    assert!(watches.is_watched(&src("a2/inner")));

    daemon.write("a2/inner/z.yml", SIMPLE_DEFINITION);
    daemon.write("a2/inner/z.xslt", KEY_VALUE_TEMPLATE);
    assert!(daemon.output("a2/inner/z").is_some());
}

#[test]
fn pairs_moved_in_with_a_directory_are_compiled() {
    let fs = mock_roots();
    let mut daemon = Daemon::start(fs, ConfigFileBuilder::new());

    daemon.fs.add_file("/tmp/staging/m.yml", SIMPLE_DEFINITION);
    daemon.fs.add_file("/tmp/staging/m.xslt", KEY_VALUE_TEMPLATE);
    daemon.fs.rename("/tmp/staging", src("staged"));
    daemon
        .backend
        .push_path(RawEventKind::MovedIn, src("staged"), true);
    daemon.dispatcher.poll().unwrap();

    assert_eq!(daemon.output("staged/m").as_deref(), Some("port=80\nhost=example.org\n"));
}

#[test]
fn a_bad_definition_does_not_stop_the_daemon() {
    let mut daemon = Daemon::start(mock_roots(), ConfigFileBuilder::new());
    daemon.write("ok.xslt", KEY_VALUE_TEMPLATE);
    daemon.write("bad.xslt", KEY_VALUE_TEMPLATE);

    daemon.write("bad.yml", "key: [unterminated\n");
    assert_eq!(daemon.output("bad"), None);

    daemon.write("ok.yml", "fine: yes\n");
    assert_eq!(daemon.output("ok").as_deref(), Some("fine=yes\n"));
}

#[test]
fn hidden_and_excluded_files_are_never_compiled() {
    let mut daemon = Daemon::start(mock_roots(), ConfigFileBuilder::new().exclude("drafts/**"));
    daemon.write(".tmp.yml", SIMPLE_DEFINITION);
    daemon.write(".tmp.xslt", KEY_VALUE_TEMPLATE);
    daemon.mkdir("drafts");
    daemon.write("drafts/d.yml", SIMPLE_DEFINITION);
    daemon.write("drafts/d.xslt", KEY_VALUE_TEMPLATE);

    assert_eq!(daemon.output(".tmp"), None);
    assert_eq!(daemon.output("drafts/d"), None);
}

#[test]
fn initial_sync_compiles_existing_pairs() {
    let fs = mock_roots();
    fs.add_file(src("pre/p.yml"), SIMPLE_DEFINITION);
    fs.add_file(src("pre/p.xslt"), KEY_VALUE_TEMPLATE);
    fs.add_file(src("orphan.yml"), SIMPLE_DEFINITION);

    let daemon = Daemon::start(fs.clone(), ConfigFileBuilder::new().initial_sync(true));
    assert_eq!(daemon.output("pre/p").as_deref(), Some("port=80\nhost=example.org\n"));
    assert_eq!(daemon.output("orphan"), None);

    let fresh = mock_roots();
    fresh.add_file(src("pre/p.yml"), SIMPLE_DEFINITION);
    fresh.add_file(src("pre/p.xslt"), KEY_VALUE_TEMPLATE);
    let daemon = Daemon::start(fresh, ConfigFileBuilder::new());
    assert_eq!(daemon.output("pre/p"), None);
}

#[test]
fn missing_or_shared_roots_are_rejected() {
    let fs = MockFileSystem::new();
    fs.add_dir(SOURCE);
    let cfg = ConfigFileBuilder::new().roots(SOURCE, ACTIVE).build();
    let err = build_dispatcher(&cfg, shared(&fs), MockWatchBackend::new()).unwrap_err();
    assert!(err.to_string().contains("active root"), "{err}");

    let fs = mock_roots();
    let backend = MockWatchBackend::new();
    backend.fail_on(SOURCE);
    let err = build_dispatcher(&cfg, shared(&fs), backend).unwrap_err();
    assert!(err.to_string().contains("failed to watch"), "{err}");
}
