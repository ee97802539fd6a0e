// src/compile/mod.rs

//! The change handler that turns a definition/template pair into its output:
//! resolve → parse → serialize → transform → publish.

pub mod hash;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, trace, warn};

use crate::engine::ChangeHandler;
use crate::errors::{ConfigdError, Result};
use crate::fs::FileSystem;
use crate::markup;
use crate::resolve::{PairLayout, PathInfo};
use crate::transform::TemplateEngine;
use crate::yaml;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileOutcome {
    Written,
    /// The output already held the generated bytes and was left alone.
    Unchanged,
}

#[derive(Debug)]
pub struct Compiler<E: TemplateEngine> {
    layout: PairLayout,
    fs: Arc<dyn FileSystem>,
    engine: E,
    skip_unchanged: bool,
}

impl<E: TemplateEngine> Compiler<E> {
    pub fn new(layout: PairLayout, fs: Arc<dyn FileSystem>, engine: E) -> Self {
        Self {
            layout,
            fs,
            engine,
            skip_unchanged: true,
        }
    }

    pub fn with_skip_unchanged(mut self, skip_unchanged: bool) -> Self {
        self.skip_unchanged = skip_unchanged;
        self
    }

    pub fn layout(&self) -> &PairLayout {
        &self.layout
    }

    /// Compile one pair and publish the result.
    ///
    /// The output is only written once the transform succeeded, so on any
    /// error the previous output stays in place.
    pub fn compile(&self, info: &PathInfo) -> Result<CompileOutcome> {
        for half in [&info.definition, &info.template] {
            if !self.fs.exists(half) {
                return Err(ConfigdError::MissingCounterpart(half.clone()));
            }
        }

        let value = yaml::parse_file(self.fs.as_ref(), &info.definition)?;
        trace!(definition = ?info.definition, "parsed definition:\n{value}");

        let document = markup::to_markup(&value);
        trace!(%document, "generated markup");

        let output = self.engine.apply(&info.template, &document)?;

        if self.skip_unchanged && hash::is_unchanged(self.fs.as_ref(), &info.output, &output) {
            debug!(output = ?info.output, "output unchanged; not rewriting");
            return Ok(CompileOutcome::Unchanged);
        }

        self.fs.write(&info.output, &output)?;
        info!(output = ?info.output, bytes = output.len(), "wrote output");
        Ok(CompileOutcome::Written)
    }

    /// Remove the output of a pair. Returns whether a file was removed.
    pub fn retract(&self, info: &PathInfo) -> Result<bool> {
        let removed = self.fs.remove_file(&info.output)?;
        if removed {
            info!(output = ?info.output, "removed output");
        } else {
            debug!(output = ?info.output, "no output to remove");
        }
        Ok(removed)
    }
}

impl<E: TemplateEngine> ChangeHandler for Compiler<E> {
    fn on_updated(&mut self, path: &Path) {
        let Some(info) = self.layout.resolve(path) else {
            trace!(?path, "not part of a pair");
            return;
        };
        if let Err(err) = self.compile(&info) {
            warn!(?path, output = ?info.output, error = %err, "compile failed");
        }
    }

    fn on_deleted(&mut self, path: &Path) {
        let Some(info) = self.layout.resolve(path) else {
            trace!(?path, "not part of a pair");
            return;
        };
        if let Err(err) = self.retract(&info) {
            warn!(?path, output = ?info.output, error = %err, "failed to remove output");
        }
    }
}
