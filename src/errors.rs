// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigdError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),

    #[error("Watch backend disconnected")]
    WatchDisconnected,

    #[error("Cannot read {path:?}: {message}")]
    SourceUnreadable { path: PathBuf, message: String },

    #[error("Missing counterpart {0:?}")]
    MissingCounterpart(PathBuf),

    #[error("YAML syntax error: {0}")]
    YamlSyntax(#[from] yaml_rust2::scanner::ScanError),

    #[error("Unexpected YAML event where a value was expected: {0}")]
    UnexpectedEvent(String),

    #[error("YAML nesting exceeds {0} levels")]
    TooDeep(usize),

    #[error("Invalid template {path:?}: {message}")]
    TemplateLoad { path: PathBuf, message: String },

    #[error("Generated markup could not be parsed: {0}")]
    MarkupParse(String),

    #[error("Template {path:?} could not be applied: {message}")]
    TemplateApply { path: PathBuf, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ConfigdError {
    /// Errors raised while parsing a definition file.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::YamlSyntax(_) | Self::UnexpectedEvent(_) | Self::TooDeep(_)
        )
    }

    /// Errors raised by the template engine.
    pub fn is_transform_error(&self) -> bool {
        matches!(
            self,
            Self::TemplateLoad { .. } | Self::MarkupParse(_) | Self::TemplateApply { .. }
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, ConfigdError>;
