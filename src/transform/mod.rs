// src/transform/mod.rs

//! Template transform stage: markup document + template file → output bytes.
//!
//! The compiler only sees the [`TemplateEngine`] trait. [`XsltEngine`] is the
//! production implementation, backed by the interpreter in [`xslt`].

pub mod xpath;
pub mod xslt;

use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use tracing::trace;

use crate::errors::{ConfigdError, Result};
use crate::fs::FileSystem;

pub use xslt::{OutputMethod, Stylesheet, StylesheetError};

/// Applies a template file to a generated markup document.
pub trait TemplateEngine: Debug {
    fn apply(&self, template: &Path, document: &str) -> Result<Vec<u8>>;
}

/// XSLT engine reading templates through the [`FileSystem`] abstraction.
///
/// Templates are re-read and re-compiled on every call, so an edited
/// template takes effect on the next compile.
#[derive(Debug, Clone)]
pub struct XsltEngine {
    fs: Arc<dyn FileSystem>,
}

impl XsltEngine {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }
}

impl TemplateEngine for XsltEngine {
    fn apply(&self, template: &Path, document: &str) -> Result<Vec<u8>> {
        let load_error = |message: String| ConfigdError::TemplateLoad {
            path: template.to_path_buf(),
            message,
        };

        let text = self
            .fs
            .read_to_string(template)
            .map_err(|err| load_error(format!("{err:#}")))?;
        let sheet = Stylesheet::parse(&text).map_err(|err| load_error(err.to_string()))?;

        let input = roxmltree::Document::parse(document)
            .map_err(|err| ConfigdError::MarkupParse(err.to_string()))?;

        let output = sheet
            .apply(&input)
            .map_err(|err| ConfigdError::TemplateApply {
                path: template.to_path_buf(),
                message: err.to_string(),
            })?;
        trace!(template = ?template, bytes = output.len(), "template applied");

        Ok(output.into_bytes())
    }
}
