// src/resolve.rs

//! Maps a changed path onto its definition/template pair and output file.

use std::path::{Path, PathBuf};

use crate::config::model::ConfigFile;
use crate::errors::Result;
use crate::watch::path_utils::{has_suffix_ignore_case, relative_str, replace_suffix};
use crate::watch::patterns::ExcludeSet;

/// Which half of a pair the changed path is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairSide {
    Definition,
    Template,
}

/// Everything needed to compile or retract one pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathInfo {
    pub trigger: PairSide,
    pub definition: PathBuf,
    pub template: PathBuf,
    pub output: PathBuf,
}

impl PathInfo {
    /// The path that caused the event.
    pub fn trigger_path(&self) -> &Path {
        match self.trigger {
            PairSide::Definition => &self.definition,
            PairSide::Template => &self.template,
        }
    }

    /// The other half of the pair.
    pub fn counterpart(&self) -> &Path {
        match self.trigger {
            PairSide::Definition => &self.template,
            PairSide::Template => &self.definition,
        }
    }
}

/// Source/active roots and naming rules for pairs.
#[derive(Debug, Clone)]
pub struct PairLayout {
    source_root: PathBuf,
    active_root: PathBuf,
    definition_suffix: String,
    template_suffix: String,
    exclude: ExcludeSet,
}

impl PairLayout {
    pub fn new(
        source_root: impl Into<PathBuf>,
        active_root: impl Into<PathBuf>,
        definition_suffix: impl Into<String>,
        template_suffix: impl Into<String>,
        exclude: ExcludeSet,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            active_root: active_root.into(),
            definition_suffix: definition_suffix.into(),
            template_suffix: template_suffix.into(),
            exclude,
        }
    }

    /// Layout from a validated config. The roots are taken as given; callers
    /// canonicalize them first.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let exclude = ExcludeSet::compile(&cfg.pairs.exclude)?;
        Ok(Self::new(
            cfg.paths.source.clone(),
            cfg.paths.active.clone(),
            cfg.pairs.definition_suffix.clone(),
            cfg.pairs.template_suffix.clone(),
            exclude,
        ))
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn active_root(&self) -> &Path {
        &self.active_root
    }

    /// Resolve `path` into its pair, or `None` if it is not part of one.
    ///
    /// The counterpart does not need to exist.
    pub fn resolve(&self, path: &Path) -> Option<PathInfo> {
        let rel = relative_str(&self.source_root, path)?;
        let name = path.file_name()?.to_str()?;
        if name.starts_with('.') || self.exclude.is_match(&rel) {
            return None;
        }

        let (trigger, suffix, other_suffix) = if has_suffix_ignore_case(name, &self.definition_suffix) {
            (PairSide::Definition, &self.definition_suffix, &self.template_suffix)
        } else if has_suffix_ignore_case(name, &self.template_suffix) {
            (PairSide::Template, &self.template_suffix, &self.definition_suffix)
        } else {
            return None;
        };

        let counterpart = replace_suffix(path, suffix, other_suffix)?;
        let rel_path = path.strip_prefix(&self.source_root).ok()?;
        let output = self
            .active_root
            .join(replace_suffix(rel_path, suffix, "")?);

        let (definition, template) = match trigger {
            PairSide::Definition => (path.to_path_buf(), counterpart),
            PairSide::Template => (counterpart, path.to_path_buf()),
        };

        Some(PathInfo {
            trigger,
            definition,
            template,
            output,
        })
    }
}
