// src/engine/runtime.rs

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

use crate::errors::Result;
use crate::watch::WatchBackend;

use super::dispatcher::{ChangeHandler, Dispatcher};

/// Async shell around the [`Dispatcher`].
///
/// Polls the dispatcher at a fixed interval until the shutdown future
/// resolves. All event processing stays on the calling task; the dispatcher
/// itself never blocks.
pub struct Runtime<B: WatchBackend, H: ChangeHandler> {
    dispatcher: Dispatcher<B, H>,
    poll_interval: Duration,
}

impl<B: WatchBackend, H: ChangeHandler> fmt::Debug for Runtime<B, H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("dispatcher", &self.dispatcher)
            .field("poll_interval", &self.poll_interval)
            .finish()
    }
}

impl<B: WatchBackend, H: ChangeHandler> Runtime<B, H> {
    pub fn new(dispatcher: Dispatcher<B, H>, poll_interval: Duration) -> Self {
        Self {
            dispatcher,
            poll_interval,
        }
    }

    /// Main loop. Returns the dispatcher once `shutdown` resolves, or the
    /// error of a broken watch backend.
    pub async fn run<F>(mut self, shutdown: F) -> Result<Dispatcher<B, H>>
    where
        F: Future<Output = ()>,
    {
        info!(poll_interval = ?self.poll_interval, "configd runtime started");

        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("shutdown requested; stopping runtime");
                    break;
                }
                _ = ticker.tick() => {
                    let processed = self.dispatcher.poll()?;
                    if processed > 0 {
                        debug!(processed, "processed watch events");
                    }
                }
            }
        }

        info!("runtime exiting");
        Ok(self.dispatcher)
    }
}
