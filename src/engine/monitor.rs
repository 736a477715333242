//! Monitor loop: pull events from the watcher and run them through the
//! pipeline one at a time until shutdown.

use super::pipeline::Pipeline;
use crate::llm::Summarizer;
use crate::sink::Sink;
use crate::telemetry::metrics;
use crate::watch::ScreenshotWatcher;
use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{error, info, warn};

/// Counts since the monitor started.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MonitorStats {
    pub detected: u64,
    pub delivered: u64,
    pub failed: u64,
}

/// Cloneable trigger for stopping a running [`Monitor`].
#[derive(Debug, Clone)]
pub struct ShutdownHandle(Arc<Notify>);

impl ShutdownHandle {
    /// Stop the monitor after the in-flight screenshot finishes.
    pub fn shutdown(&self) {
        self.0.notify_one();
    }
}

pub struct Monitor<S, K> {
    watcher: ScreenshotWatcher,
    pipeline: Pipeline<S, K>,
    shutdown: Arc<Notify>,
    stats: MonitorStats,
}

impl<S: Summarizer, K: Sink> Monitor<S, K> {
    pub fn new(watcher: ScreenshotWatcher, pipeline: Pipeline<S, K>) -> Self {
        Self {
            watcher,
            pipeline,
            shutdown: Arc::new(Notify::new()),
            stats: MonitorStats::default(),
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle(Arc::clone(&self.shutdown))
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn pipeline_mut(&mut self) -> &mut Pipeline<S, K> {
        &mut self.pipeline
    }

    /// Run until shutdown is requested or the watcher closes.
    ///
    /// Per-screenshot failures are logged and the loop moves on.
    pub async fn run(&mut self) -> MonitorStats {
        info!(dir = %self.watcher.dir().display(), "monitoring for screenshots");

        loop {
            let event = tokio::select! {
                biased;
                _ = self.shutdown.notified() => {
                    info!("monitor shutting down");
                    break;
                }
                event = self.watcher.next() => event,
            };

            let Some(event) = event else {
                warn!("watcher closed, stopping monitor");
                break;
            };

            self.stats.detected += 1;
            metrics::screenshots_detected().add(1, &[]);

            match self.pipeline.process(event).await {
                Ok(processed) => {
                    self.stats.delivered += 1;
                    info!(delivery = processed.delivery.label(), "screenshot processed");
                }
                Err(e) => {
                    self.stats.failed += 1;
                    error!(error = %e, "screenshot processing failed");
                }
            }
        }

        self.stats
    }
}
