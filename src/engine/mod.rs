// src/engine/mod.rs

//! Orchestration engine for configd.
//!
//! This module ties together:
//! - the pure routing table that classifies raw watch events ([`core`])
//! - the dispatcher that owns the watch table and the change handler and
//!   applies each routed event ([`dispatcher`])
//! - the async loop that polls the dispatcher until shutdown ([`runtime`])

pub mod core;
pub mod dispatcher;
pub mod runtime;

pub use core::{classify, Route};
pub use dispatcher::{ChangeHandler, Dispatcher};
pub use runtime::Runtime;
