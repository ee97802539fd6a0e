use std::path::{Path, PathBuf};
use std::sync::Arc;

use configd::compile::{CompileOutcome, Compiler};
use configd::engine::ChangeHandler;
use configd::errors::{ConfigdError, Result};
use configd::fs::mock::MockFileSystem;
use configd::resolve::PairLayout;
use configd::transform::{TemplateEngine, XsltEngine};
use configd::watch::ExcludeSet;

mod common;
use crate::common::fixtures::{BROKEN_TEMPLATE, KEY_VALUE_TEMPLATE, SIMPLE_DEFINITION};
use crate::common::{init_tracing, mock_roots, read_string, shared, ACTIVE, SOURCE};

fn src(rel: &str) -> PathBuf {
    Path::new(SOURCE).join(rel)
}

fn out(rel: &str) -> PathBuf {
    Path::new(ACTIVE).join(rel)
}

fn layout() -> PairLayout {
    PairLayout::new(SOURCE, ACTIVE, ".yml", ".xslt", ExcludeSet::default())
}

fn compiler(fs: &MockFileSystem) -> Compiler<XsltEngine> {
    Compiler::new(layout(), shared(fs), XsltEngine::new(shared(fs)))
}

#[test]
fn compiles_a_pair_into_the_mirrored_location() {
    init_tracing();
    let fs = mock_roots();
    fs.add_file(src("app/web.yml"), SIMPLE_DEFINITION);
    fs.add_file(src("app/web.xslt"), KEY_VALUE_TEMPLATE);
    let compiler = compiler(&fs);

    let info = compiler.layout().resolve(&src("app/web.xslt")).unwrap();
    assert_eq!(compiler.compile(&info).unwrap(), CompileOutcome::Written);

    assert_eq!(
        read_string(&fs, out("app/web")).as_deref(),
        Some("port=80\nhost=example.org\n")
    );
}

#[test]
fn missing_counterpart_is_reported_and_nothing_is_written() {
    let fs = mock_roots();
    fs.add_file(src("lonely.yml"), SIMPLE_DEFINITION);
    let compiler = compiler(&fs);

    let info = compiler.layout().resolve(&src("lonely.yml")).unwrap();
    let err = compiler.compile(&info).unwrap_err();
    match err {
        ConfigdError::MissingCounterpart(path) => assert_eq!(path, src("lonely.xslt")),
        other => panic!("unexpected error {other:?}"),
    }
    assert!(read_string(&fs, out("lonely")).is_none());
}

#[test]
fn failures_leave_the_previous_output_in_place() {
    let fs = mock_roots();
    fs.add_file(src("svc.yml"), SIMPLE_DEFINITION);
    fs.add_file(src("svc.xslt"), KEY_VALUE_TEMPLATE);
    fs.add_file(out("svc"), "previous");
    let mut compiler = compiler(&fs);

    fs.add_file(src("svc.yml"), "key: [broken\n");
    compiler.on_updated(&src("svc.yml"));
    assert_eq!(read_string(&fs, out("svc")).as_deref(), Some("previous"));

    fs.add_file(src("svc.yml"), SIMPLE_DEFINITION);
    fs.add_file(src("svc.xslt"), BROKEN_TEMPLATE);
    compiler.on_updated(&src("svc.yml"));
    assert_eq!(read_string(&fs, out("svc")).as_deref(), Some("previous"));

    fs.add_file(src("svc.xslt"), KEY_VALUE_TEMPLATE);
    compiler.on_updated(&src("svc.xslt"));
    assert_eq!(
        read_string(&fs, out("svc")).as_deref(),
        Some("port=80\nhost=example.org\n")
    );
}

#[test]
fn identical_output_is_not_rewritten() {
    let fs = mock_roots();
    fs.add_file(src("a.yml"), SIMPLE_DEFINITION);
    fs.add_file(src("a.xslt"), KEY_VALUE_TEMPLATE);
    let compiler = compiler(&fs);
    let info = compiler.layout().resolve(&src("a.yml")).unwrap();

    assert_eq!(compiler.compile(&info).unwrap(), CompileOutcome::Written);
    assert_eq!(compiler.compile(&info).unwrap(), CompileOutcome::Unchanged);

    let always = compiler.with_skip_unchanged(false);
    assert_eq!(always.compile(&info).unwrap(), CompileOutcome::Written);
}

#[test]
fn deletion_removes_output_and_tolerates_absence() {
    let fs = mock_roots();
    fs.add_file(src("d/x.yml"), SIMPLE_DEFINITION);
    fs.add_file(src("d/x.xslt"), KEY_VALUE_TEMPLATE);
    let mut compiler = compiler(&fs);
    compiler.on_updated(&src("d/x.yml"));
    assert!(read_string(&fs, out("d/x")).is_some());

    let info = compiler.layout().resolve(&src("d/x.yml")).unwrap();
    assert!(compiler.retract(&info).unwrap());
    assert!(!compiler.retract(&info).unwrap());

    // Through the handler interface, twice, without panicking.
    compiler.on_deleted(&src("d/x.xslt"));
    compiler.on_deleted(&src("d/x.xslt"));
    assert!(read_string(&fs, out("d/x")).is_none());
}

#[test]
fn paths_outside_pairs_are_ignored() {
    let fs = mock_roots();
    fs.add_file(src("notes.txt"), "hello");
    fs.add_file(src(".hidden.yml"), SIMPLE_DEFINITION);
    fs.add_file(src(".hidden.xslt"), KEY_VALUE_TEMPLATE);
    let mut compiler = compiler(&fs);

    compiler.on_updated(&src("notes.txt"));
    compiler.on_updated(&src(".hidden.yml"));
    compiler.on_deleted(&src("notes.txt"));

    assert!(read_string(&fs, out("notes.txt")).is_none());
    assert!(read_string(&fs, out(".hidden")).is_none());
}

/// Engine that echoes the generated markup, to pin down what the template
/// stage receives.
#[derive(Debug)]
struct EchoEngine;

impl TemplateEngine for EchoEngine {
    fn apply(&self, _template: &Path, document: &str) -> Result<Vec<u8>> {
        Ok(document.as_bytes().to_vec())
    }
}

#[test]
fn template_engine_receives_the_serialized_definition() {
    let fs = mock_roots();
    fs.add_file(src("e.yml"), "- one\n");
    fs.add_file(src("e.xslt"), "");
    let compiler = Compiler::new(layout(), Arc::new(fs.clone()), EchoEngine);

    let info = compiler.layout().resolve(&src("e.yml")).unwrap();
    compiler.compile(&info).unwrap();

    assert_eq!(
        read_string(&fs, out("e")).as_deref(),
        Some("<?xml version=\"1.0\"?><configuration><list><string>one</string></list></configuration>")
    );
}
