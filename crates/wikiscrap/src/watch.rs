//! Configuration file watcher.
//!
//! `notify` watches the directory holding the file, so editors that save by
//! writing a temporary file and renaming it over the original are still
//! seen. Matching events are forwarded over a crossbeam channel that the main
//! loop drains; a change is reported once the file has been quiet for the
//! debounce window.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::{unbounded, Receiver};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, error, info};

pub struct ConfigWatcher {
    path: PathBuf,
    debounce: Duration,
    changes: Receiver<()>,
    /// Deadline after the most recent change; `None` when nothing is pending.
    pending: Option<Instant>,
    _watcher: RecommendedWatcher,
}

impl ConfigWatcher {
    /// Starts watching `path`. The file may not exist yet, but its directory
    /// must.
    pub fn new(path: PathBuf, debounce: Duration) -> Result<Self> {
        let file_name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| anyhow!("{} does not name a file", path.display()))?;
        let watch_dir = path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .to_path_buf();

        let (tx, changes) = unbounded();
        let mut watcher = notify::recommended_watcher(move |result: notify::Result<Event>| {
            match result {
                Ok(event) => {
                    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        return;
                    }
                    let ours = event
                        .paths
                        .iter()
                        .any(|changed| changed.file_name() == Some(file_name.as_os_str()));
                    if ours {
                        debug!(kind = ?event.kind, "configuration file event");
                        let _ = tx.send(());
                    }
                }
                Err(err) => error!("configuration watcher error: {err}"),
            }
        })
        .context("failed to create configuration watcher")?;
        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", watch_dir.display()))?;
        info!(path = %path.display(), ?debounce, "watching configuration file");

        Ok(Self {
            path,
            debounce,
            changes,
            pending: None,
            _watcher: watcher,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_debounce(&mut self, debounce: Duration) {
        self.debounce = debounce;
    }

    /// Drains pending notifications. Returns `true` once no new change has
    /// arrived for the debounce window.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.changes.try_iter().count() > 0 {
            self.pending = Some(now + self.debounce);
        }
        match self.pending {
            Some(deadline) if now >= deadline => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }
}
