// src/lib.rs

pub mod cli;
pub mod compile;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod markup;
pub mod resolve;
pub mod transform;
pub mod value;
pub mod watch;
pub mod yaml;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::compile::Compiler;
use crate::config::loader::load_or_default;
use crate::config::model::ConfigFile;
use crate::engine::{Dispatcher, Runtime};
use crate::errors::ConfigdError;
use crate::fs::{FileSystem, RealFileSystem};
use crate::resolve::PairLayout;
use crate::transform::XsltEngine;
use crate::watch::{NotifyBackend, WatchBackend, WatchManager};

/// The dispatcher as wired up for a real run.
pub type DaemonDispatcher<B> = Dispatcher<B, Compiler<XsltEngine>>;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the pair layout, template engine and compiler
/// - the watch manager on top of `notify`
/// - the polling runtime, stopped by Ctrl-C
pub async fn run(args: CliArgs) -> Result<()> {
    let mut cfg = load_or_default(args.config.as_deref())?;
    apply_cli_overrides(&mut cfg, &args);

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let backend = NotifyBackend::new()?;
    let dispatcher = build_dispatcher(&cfg, fs, backend)?;

    let runtime = Runtime::new(dispatcher, cfg.daemon.poll_interval());
    runtime.run(shutdown_signal()).await?;
    Ok(())
}

/// Positional roots replace `[paths]`; `--initial-sync` forces the sync on.
pub fn apply_cli_overrides(cfg: &mut ConfigFile, args: &CliArgs) {
    if let (Some(source), Some(active)) = (&args.source, &args.active) {
        cfg.override_paths(source.clone(), active.clone());
    }
    if args.initial_sync {
        cfg.daemon.initial_sync = true;
    }
}

/// Build the daemon state for `cfg` on top of the given filesystem and watch
/// backend, and start watching the source root.
///
/// Both roots must be existing directories. They are canonicalized so that
/// paths reported by the backend line up with the layout.
pub fn build_dispatcher<B: WatchBackend>(
    cfg: &ConfigFile,
    fs: Arc<dyn FileSystem>,
    backend: B,
) -> Result<DaemonDispatcher<B>> {
    let source = existing_dir(fs.as_ref(), &cfg.paths.source, "source")?;
    let active = existing_dir(fs.as_ref(), &cfg.paths.active, "active")?;
    if source == active {
        return Err(ConfigdError::ConfigError(format!(
            "source and active roots resolve to the same directory {source:?}"
        ))
        .into());
    }
    info!(?source, ?active, "configd roots");

    let mut resolved = cfg.clone();
    resolved.override_paths(source.clone(), active);
    let layout = PairLayout::from_config(&resolved)?;

    let engine = XsltEngine::new(Arc::clone(&fs));
    let compiler = Compiler::new(layout, Arc::clone(&fs), engine)
        .with_skip_unchanged(cfg.daemon.skip_unchanged_output);

    let watches = WatchManager::new(backend, fs);
    let mut dispatcher = Dispatcher::new(watches, compiler);
    dispatcher.watch_root(&source, cfg.daemon.initial_sync);

    if !dispatcher.watches().is_watched(&source) {
        return Err(ConfigdError::ConfigError(format!(
            "failed to watch source root {source:?}"
        ))
        .into());
    }

    Ok(dispatcher)
}

fn existing_dir(fs: &dyn FileSystem, path: &Path, role: &str) -> Result<PathBuf> {
    if !fs.is_dir(path) {
        return Err(ConfigdError::ConfigError(format!(
            "{role} root {path:?} is not a directory"
        ))
        .into());
    }
    fs.canonicalize(path)
}

/// Resolves on Ctrl-C. If the handler cannot be installed the daemon keeps
/// running until killed.
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
