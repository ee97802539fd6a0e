// src/config/validate.rs

use crate::config::model::{ConfigFile, DaemonSection, PairsSection, PathsSection, RawConfigFile};
use crate::errors::{ConfigdError, Result};
use crate::watch::patterns::ExcludeSet;

const MAX_POLL_INTERVAL_MS: u64 = 60_000;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = ConfigdError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.paths, raw.pairs, raw.daemon))
    }
}

pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_paths(&cfg.paths)?;
    validate_pairs(&cfg.pairs)?;
    validate_daemon(&cfg.daemon)?;
    Ok(())
}

fn validate_paths(paths: &PathsSection) -> Result<()> {
    if paths.source.as_os_str().is_empty() || paths.active.as_os_str().is_empty() {
        return Err(ConfigdError::ConfigError(
            "[paths].source and [paths].active must not be empty".to_string(),
        ));
    }
    if paths.source == paths.active {
        return Err(ConfigdError::ConfigError(format!(
            "[paths].source and [paths].active must differ (both are {:?})",
            paths.source
        )));
    }
    Ok(())
}

fn validate_pairs(pairs: &PairsSection) -> Result<()> {
    validate_suffix("definition_suffix", &pairs.definition_suffix)?;
    validate_suffix("template_suffix", &pairs.template_suffix)?;

    if pairs
        .definition_suffix
        .eq_ignore_ascii_case(&pairs.template_suffix)
    {
        return Err(ConfigdError::ConfigError(format!(
            "[pairs].definition_suffix and [pairs].template_suffix must differ (got {:?})",
            pairs.definition_suffix
        )));
    }

    ExcludeSet::compile(&pairs.exclude)
        .map_err(|err| ConfigdError::ConfigError(format!("[pairs].exclude: {err:#}")))?;

    Ok(())
}

fn validate_suffix(field: &str, suffix: &str) -> Result<()> {
    if suffix.len() < 2 || !suffix.starts_with('.') {
        return Err(ConfigdError::ConfigError(format!(
            "[pairs].{field} must start with '.' and name an extension (got {suffix:?})"
        )));
    }
    if suffix.contains('/') || suffix.contains('\\') {
        return Err(ConfigdError::ConfigError(format!(
            "[pairs].{field} must not contain path separators (got {suffix:?})"
        )));
    }
    Ok(())
}

fn validate_daemon(daemon: &DaemonSection) -> Result<()> {
    if daemon.poll_interval_ms == 0 || daemon.poll_interval_ms > MAX_POLL_INTERVAL_MS {
        return Err(ConfigdError::ConfigError(format!(
            "[daemon].poll_interval_ms must be within 1..={MAX_POLL_INTERVAL_MS} (got {})",
            daemon.poll_interval_ms
        )));
    }
    Ok(())
}
