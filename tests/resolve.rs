use std::path::{Path, PathBuf};

use proptest::prelude::*;

use configd::resolve::{PairLayout, PairSide, PathInfo};
use configd::watch::ExcludeSet;

mod common;
use crate::common::ConfigFileBuilder;

fn layout() -> PairLayout {
    PairLayout::new("/etc/configd", "/etc", ".yml", ".xslt", ExcludeSet::default())
}

#[test]
fn definition_resolves_to_template_and_output() {
    let info = layout().resolve(Path::new("/etc/configd/nginx/site.yml")).unwrap();
    assert_eq!(
        info,
        PathInfo {
            trigger: PairSide::Definition,
            definition: PathBuf::from("/etc/configd/nginx/site.yml"),
            template: PathBuf::from("/etc/configd/nginx/site.xslt"),
            output: PathBuf::from("/etc/nginx/site"),
        }
    );
    assert_eq!(info.trigger_path(), Path::new("/etc/configd/nginx/site.yml"));
    assert_eq!(info.counterpart(), Path::new("/etc/configd/nginx/site.xslt"));
}

#[test]
fn template_resolves_symmetrically() {
    let info = layout().resolve(Path::new("/etc/configd/hosts.xslt")).unwrap();
    assert_eq!(info.trigger, PairSide::Template);
    assert_eq!(info.definition, PathBuf::from("/etc/configd/hosts.yml"));
    assert_eq!(info.output, PathBuf::from("/etc/hosts"));
}

#[test]
fn suffixes_match_case_insensitively() {
    let info = layout().resolve(Path::new("/etc/configd/App.YML")).unwrap();
    assert_eq!(info.template, PathBuf::from("/etc/configd/App.xslt"));
    assert_eq!(info.output, PathBuf::from("/etc/App"));
}

#[test]
fn rejects_paths_outside_pairs() {
    let layout = layout();
    for path in [
        "/etc/configd/.hidden.yml",
        "/etc/configd/sub/.swp.xslt",
        "/etc/configd/readme.txt",
        "/etc/configd/noext",
        "/etc/other/x.yml",
        "/etc/configd",
    ] {
        assert!(layout.resolve(Path::new(path)).is_none(), "{path} resolved");
    }
}

#[test]
fn hidden_directories_do_not_hide_files() {
    let info = layout().resolve(Path::new("/etc/configd/.d/x.yml")).unwrap();
    assert_eq!(info.output, PathBuf::from("/etc/.d/x"));
}

#[test]
fn exclude_globs_apply_to_relative_paths() {
    let cfg = ConfigFileBuilder::new()
        .roots("/etc/configd", "/etc")
        .exclude("**/*.bak.yml")
        .exclude("scratch/**")
        .build();
    let layout = PairLayout::from_config(&cfg).unwrap();

    assert!(layout.resolve(Path::new("/etc/configd/a/b.bak.yml")).is_none());
    assert!(layout.resolve(Path::new("/etc/configd/scratch/x.yml")).is_none());
    assert!(layout.resolve(Path::new("/etc/configd/a/b.yml")).is_some());
}

#[test]
fn custom_suffixes() {
    let layout = PairLayout::new("/src", "/out", ".def", ".tpl", ExcludeSet::default());
    let info = layout.resolve(Path::new("/src/x.conf.tpl")).unwrap();
    assert_eq!(info.definition, PathBuf::from("/src/x.conf.def"));
    assert_eq!(info.output, PathBuf::from("/out/x.conf"));
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_][a-zA-Z0-9_.-]{0,12}"
}

fn rel_dir_strategy() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec("[a-z0-9_]{1,8}", 0..4)
}

proptest! {
    #[test]
    fn resolving_the_counterpart_gives_the_same_pair(
        dirs in rel_dir_strategy(),
        stem in name_strategy(),
        from_definition in any::<bool>(),
    ) {
        let layout = layout();
        let mut path = PathBuf::from("/etc/configd");
        for dir in &dirs {
            path.push(dir);
        }
        let suffix = if from_definition { ".yml" } else { ".xslt" };
        path.push(format!("{stem}{suffix}"));

        let info = layout.resolve(&path).unwrap();
        let back = layout.resolve(info.counterpart()).unwrap();

        prop_assert_eq!(back.counterpart(), path.as_path());
        prop_assert_eq!(&back.output, &info.output);
        prop_assert_eq!(&back.definition, &info.definition);
        prop_assert_eq!(&back.template, &info.template);
        prop_assert_ne!(back.trigger, info.trigger);

        let mut expected_output = PathBuf::from("/etc");
        for dir in &dirs {
            expected_output.push(dir);
        }
        expected_output.push(&stem);
        prop_assert_eq!(info.output, expected_output);
    }

    #[test]
    fn hidden_names_never_resolve(
        dirs in rel_dir_strategy(),
        stem in "[a-zA-Z0-9_.-]{0,12}",
        suffix in prop_oneof![Just(".yml"), Just(".xslt"), Just(".YML"), Just("")],
    ) {
        let mut path = PathBuf::from("/etc/configd");
        for dir in &dirs {
            path.push(dir);
        }
        path.push(format!(".{stem}{suffix}"));
        prop_assert!(layout().resolve(&path).is_none());
    }
}
