// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_SOURCE_ROOT: &str = "/etc/configd";
pub const DEFAULT_ACTIVE_ROOT: &str = "/etc";
pub const DEFAULT_DEFINITION_SUFFIX: &str = ".yml";
pub const DEFAULT_TEMPLATE_SUFFIX: &str = ".xslt";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [paths]
/// source = "/etc/configd"
/// active = "/etc"
///
/// [pairs]
/// definition_suffix = ".yml"
/// template_suffix = ".xslt"
/// exclude = ["**/*.bak.yml"]
///
/// [daemon]
/// poll_interval_ms = 50
/// initial_sync = false
/// skip_unchanged_output = true
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub pairs: PairsSection,

    #[serde(default)]
    pub daemon: DaemonSection,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub paths: PathsSection,
    pub pairs: PairsSection,
    pub daemon: DaemonSection,
}

impl ConfigFile {
    /// Internal constructor used once validation has passed.
    pub(crate) fn new_unchecked(
        paths: PathsSection,
        pairs: PairsSection,
        daemon: DaemonSection,
    ) -> Self {
        Self {
            paths,
            pairs,
            daemon,
        }
    }

    /// Replace both roots, as done for the two positional CLI arguments.
    pub fn override_paths(&mut self, source: impl Into<PathBuf>, active: impl Into<PathBuf>) {
        self.paths.source = source.into();
        self.paths.active = active.into();
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(
            PathsSection::default(),
            PairsSection::default(),
            DaemonSection::default(),
        )
    }
}

/// `[paths]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathsSection {
    /// Root of the watched definition/template tree.
    #[serde(default = "default_source")]
    pub source: PathBuf,

    /// Root that generated files are mirrored into.
    #[serde(default = "default_active")]
    pub active: PathBuf,
}

fn default_source() -> PathBuf {
    PathBuf::from(DEFAULT_SOURCE_ROOT)
}

fn default_active() -> PathBuf {
    PathBuf::from(DEFAULT_ACTIVE_ROOT)
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            source: default_source(),
            active: default_active(),
        }
    }
}

/// `[pairs]` section: how definition and template files are recognised.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PairsSection {
    #[serde(default = "default_definition_suffix")]
    pub definition_suffix: String,

    #[serde(default = "default_template_suffix")]
    pub template_suffix: String,

    /// Glob patterns (relative to the source root) that are never compiled.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_definition_suffix() -> String {
    DEFAULT_DEFINITION_SUFFIX.to_string()
}

fn default_template_suffix() -> String {
    DEFAULT_TEMPLATE_SUFFIX.to_string()
}

impl Default for PairsSection {
    fn default() -> Self {
        Self {
            definition_suffix: default_definition_suffix(),
            template_suffix: default_template_suffix(),
            exclude: Vec::new(),
        }
    }
}

/// `[daemon]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DaemonSection {
    /// Delay between two non-blocking polls of the watch backend.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Compile every existing pair once the source root is watched.
    #[serde(default)]
    pub initial_sync: bool,

    /// Leave the output file untouched when the generated bytes are identical.
    #[serde(default = "default_true")]
    pub skip_unchanged_output: bool,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_true() -> bool {
    true
}

impl DaemonSection {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for DaemonSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            initial_sync: false,
            skip_unchanged_output: true,
        }
    }
}
