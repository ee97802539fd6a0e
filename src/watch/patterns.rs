// src/watch/patterns.rs

use std::fmt;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled `[pairs].exclude` glob patterns.
///
/// Patterns are relative to the source root and matched against
/// `/`-separated relative paths such as `"nginx/sites/default.yml"`.
///
/// ```toml
/// [pairs]
/// exclude = ["**/*.bak.yml", "scratch/**"]
/// ```
#[derive(Clone, Default)]
pub struct ExcludeSet {
    patterns: Vec<String>,
    set: Option<GlobSet>,
}

impl fmt::Debug for ExcludeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExcludeSet")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl ExcludeSet {
    /// Compile a list of patterns. An empty list excludes nothing.
    pub fn compile(patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self::default());
        }
        Ok(Self {
            patterns: patterns.to_vec(),
            set: Some(build_globset(patterns)?),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_none()
    }

    /// Returns true if `rel_path` (relative to the source root) is excluded.
    pub fn is_match(&self, rel_path: &str) -> bool {
        self.set
            .as_ref()
            .is_some_and(|set| set.is_match(rel_path))
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
