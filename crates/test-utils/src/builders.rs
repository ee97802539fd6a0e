#![allow(dead_code)]

use std::path::Path;

use configd::config::{ConfigFile, DaemonSection, PairsSection, PathsSection, RawConfigFile};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                paths: PathsSection::default(),
                pairs: PairsSection::default(),
                daemon: DaemonSection::default(),
            },
        }
    }

    pub fn roots(mut self, source: impl AsRef<Path>, active: impl AsRef<Path>) -> Self {
        self.config.paths.source = source.as_ref().to_path_buf();
        self.config.paths.active = active.as_ref().to_path_buf();
        self
    }

    pub fn suffixes(mut self, definition: &str, template: &str) -> Self {
        self.config.pairs.definition_suffix = definition.to_string();
        self.config.pairs.template_suffix = template.to_string();
        self
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.config.pairs.exclude.push(pattern.to_string());
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.daemon.poll_interval_ms = ms;
        self
    }

    pub fn initial_sync(mut self, val: bool) -> Self {
        self.config.daemon.initial_sync = val;
        self
    }

    pub fn skip_unchanged_output(mut self, val: bool) -> Self {
        self.config.daemon.skip_unchanged_output = val;
        self
    }

    /// The unvalidated config, for exercising validation failures.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
