//! Directory watcher: turns filesystem notifications into a stream of
//! [`ScreenshotEvent`]s.
//!
//! The notify backend runs on its own thread and pushes matching paths into
//! an unbounded channel. [`ScreenshotWatcher::next`] pulls them one at a
//! time, dropping paths it has already emitted.

pub mod filter;

pub use filter::{is_screenshot_name, is_screenshot_path, screenshot_paths};

use crate::config::settings::WatchSettings;
use crate::error::{Error, Result};
use crate::model::ScreenshotEvent;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Watches one directory (non-recursively) for new screenshots.
pub struct ScreenshotWatcher {
    // Dropping the notify watcher stops the backend thread.
    _watcher: RecommendedWatcher,
    rx: mpsc::UnboundedReceiver<PathBuf>,
    seen: HashSet<PathBuf>,
    dir: PathBuf,
}

impl ScreenshotWatcher {
    /// Start watching `dir`.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the directory does not exist or cannot be
    /// read, and [`Error::Watch`] if the OS watch cannot be registered.
    pub fn new(dir: &Path) -> Result<Self> {
        check_readable_dir(dir)?;

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) => {
                    for path in screenshot_paths(&event) {
                        // Receiver gone means the watcher is being dropped.
                        let _ = tx.send(path);
                    }
                }
                Err(e) => warn!(error = %e, "filesystem notification error, continuing"),
            }
        })?;
        watcher.watch(dir, RecursiveMode::NonRecursive)?;

        info!(dir = %dir.display(), "watching for screenshots");

        Ok(Self {
            _watcher: watcher,
            rx,
            seen: HashSet::new(),
            dir: dir.to_path_buf(),
        })
    }

    /// The directory being watched.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Wait for the next screenshot not seen before.
    ///
    /// Returns `None` only if the notify backend has shut down.
    pub async fn next(&mut self) -> Option<ScreenshotEvent> {
        while let Some(path) = self.rx.recv().await {
            if self.seen.insert(path.clone()) {
                let event = ScreenshotEvent::new(path);
                info!(id = %event.id, file = %event.file_name(), "new screenshot detected");
                return Some(event);
            }
            debug!(path = %path.display(), "duplicate notification ignored");
        }
        None
    }
}

/// Fail fast with a configuration error unless `dir` is a readable directory.
pub fn check_readable_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(Error::Config(format!(
            "watch directory {} does not exist or is not a directory",
            dir.display()
        )));
    }
    std::fs::read_dir(dir).map_err(|e| {
        Error::Config(format!("cannot read watch directory {}: {e}", dir.display()))
    })?;
    Ok(())
}

/// Wait until a freshly reported file has finished writing, then read it.
///
/// Sleeps the settle delay, then polls: the file is ready once it is
/// non-empty and its size matches the previous poll. On the last poll any
/// non-empty file is accepted.
pub async fn read_when_ready(path: &Path, settings: &WatchSettings) -> Result<Vec<u8>> {
    tokio::time::sleep(settings.settle()).await;

    let attempts = settings.ready_attempts.max(1);
    let mut previous_len = None;
    for attempt in 1..=attempts {
        if let Ok(meta) = tokio::fs::metadata(path).await {
            let len = meta.len();
            if len > 0 && (previous_len == Some(len) || attempt == attempts) {
                return Ok(tokio::fs::read(path).await?);
            }
            if len > 0 {
                previous_len = Some(len);
            }
        }
        if attempt < attempts {
            debug!(path = %path.display(), attempt, attempts, "waiting for file to be ready");
            tokio::time::sleep(settings.ready_interval()).await;
        }
    }

    Err(Error::Other(format!(
        "{} was not ready after {attempts} checks",
        path.display()
    )))
}
