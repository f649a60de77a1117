//! Host loop - repeatedly asks a crawler for the next repository
//!
//! The runner owns everything the crawler deliberately does not: the
//! persisted cursor, delivery of results, and the delays applied when the
//! listing is exhausted or a crawl call fails.

use anyhow::{Context, Result};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, error, info};

use crate::config::RunnerConfig;
use crate::discovery::Crawl;
use crate::publish::Publisher;
use crate::state::CursorStore;

/// Timing and stop conditions for a run
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Wait after the listing had nothing past the cursor
    pub idle_delay: Duration,

    /// Wait before retrying a failed crawl call
    pub error_delay: Duration,

    /// Stop after this many accepted repositories
    pub max_results: Option<u64>,
}

impl RunOptions {
    pub fn from_config(config: &RunnerConfig, max_results: Option<u64>) -> Self {
        Self {
            idle_delay: Duration::from_secs(config.idle_delay_secs),
            error_delay: Duration::from_secs(config.error_delay_secs),
            max_results,
        }
    }
}

/// Counters for a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub accepted: u64,
    pub exhausted_polls: u64,
    pub failed_calls: u64,
    pub last_cursor: Option<String>,
}

enum Wait {
    Elapsed,
    Shutdown,
}

/// Drives a [`Crawl`] implementation until shutdown or a result limit
pub struct Runner<C, S, P> {
    crawler: C,
    store: S,
    publisher: P,
    options: RunOptions,
}

impl<C, S, P> Runner<C, S, P>
where
    C: Crawl,
    S: CursorStore,
    P: Publisher,
{
    pub fn new(crawler: C, store: S, publisher: P, options: RunOptions) -> Self {
        Self {
            crawler,
            store,
            publisher,
            options,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Run the crawl loop.
    ///
    /// Crawl errors are logged and retried after `error_delay` with the same
    /// cursor. Publishing or cursor persistence failures end the run.
    pub async fn run(&mut self, mut shutdown: broadcast::Receiver<()>) -> Result<RunSummary> {
        let started = Instant::now();
        let mut summary = RunSummary {
            last_cursor: self.store.load_cursor()?,
            ..Default::default()
        };

        info!(
            "Starting {} crawl from cursor {:?}",
            self.crawler.provider_name(),
            summary.last_cursor
        );

        loop {
            if let Some(limit) = self.options.max_results {
                if summary.accepted >= limit {
                    info!("Reached limit of {} repositories", limit);
                    break;
                }
            }

            let next = tokio::select! {
                _ = shutdown.recv() => {
                    info!("Shutdown signal received in crawl loop");
                    break;
                }
                next = self.crawler.crawl_next(summary.last_cursor.as_deref()) => next,
            };

            let delay = match next {
                Ok(Some(result)) => {
                    self.publisher
                        .publish(&result)
                        .with_context(|| format!("Failed to publish repository {}", result.id))?;
                    self.store
                        .commit(&result)
                        .with_context(|| format!("Failed to persist cursor {}", result.id))?;

                    summary.accepted += 1;
                    summary.last_cursor = Some(result.id);
                    continue;
                }
                Ok(None) => {
                    summary.exhausted_polls += 1;
                    debug!(
                        "No new repositories, waiting {:?} before polling again",
                        self.options.idle_delay
                    );
                    self.options.idle_delay
                }
                Err(e) => {
                    summary.failed_calls += 1;
                    error!(
                        "Crawl failed, retrying in {:?}: {}",
                        self.options.error_delay, e
                    );
                    self.options.error_delay
                }
            };

            if let Wait::Shutdown = Self::wait(delay, &mut shutdown).await {
                info!("Shutdown signal received while waiting");
                break;
            }
        }

        info!(
            "Crawl loop finished in {:.2}s: {} accepted, {} empty polls, {} failed calls",
            started.elapsed().as_secs_f64(),
            summary.accepted,
            summary.exhausted_polls,
            summary.failed_calls
        );

        Ok(summary)
    }

    async fn wait(delay: Duration, shutdown: &mut broadcast::Receiver<()>) -> Wait {
        tokio::select! {
            _ = shutdown.recv() => Wait::Shutdown,
            _ = tokio::time::sleep(delay) => Wait::Elapsed,
        }
    }
}

/// Create a shutdown channel and forward Ctrl+C into it
pub fn shutdown_on_ctrl_c() -> broadcast::Sender<()> {
    let (sender, _) = broadcast::channel(1);
    let signal_sender = sender.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => debug!("Ctrl+C received"),
            Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
        }
        let _ = signal_sender.send(());
    });
    sender
}
