// src/watch/mod.rs

//! Directory watching.
//!
//! This module is responsible for:
//! - Keeping every directory of the source tree under a non-recursive watch
//!   as directories come and go ([`manager`]).
//! - Talking to the OS through `notify` ([`watcher`]), or to a hand-driven
//!   fake in tests ([`mock`]).
//! - Path helpers and exclude globs used when resolving changed files.
//!
//! It does **not** know about definition/template pairs; that is the job of
//! [`crate::resolve`] and [`crate::compile`].

pub mod backend;
pub mod manager;
pub mod mock;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use backend::{RawEvent, RawEventKind, WatchBackend, WatchHandle};
pub use manager::{Discovery, WatchManager};
pub use mock::MockWatchBackend;
pub use patterns::ExcludeSet;
pub use watcher::NotifyBackend;
