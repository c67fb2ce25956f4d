// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem watch abstraction (spec.md §4.3 consumers: "subscribing to
//! a filesystem-watcher wake-up when the storage file or mutation log
//! changes"). A trait keeps the `notify` backend swappable for a polling
//! fallback when native watching is unavailable (spec.md §9 design
//! notes).

use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcherTrait};
use tokio::sync::mpsc;

/// A wake-up channel for "the watched file changed". Payload-free: the
/// debouncer that receives it re-exports unconditionally rather than
/// trying to interpret which fields changed.
pub trait FsWatcher: Send {
    fn wakeups(&mut self) -> mpsc::Receiver<()>;
}

/// `notify`-backed watcher for one file (`issues.jsonl` or `beads.db`).
pub struct NativeWatcher {
    _inner: RecommendedWatcher,
    rx: Option<mpsc::Receiver<()>>,
}

impl NativeWatcher {
    pub fn watch(path: &Path) -> notify::Result<Self> {
        let (tx, rx) = mpsc::channel(16);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            if res.is_ok() {
                let _ = tx.try_send(());
            }
        })?;
        watcher.watch(path, RecursiveMode::NonRecursive)?;
        Ok(Self { _inner: watcher, rx: Some(rx) })
    }
}

impl FsWatcher for NativeWatcher {
    fn wakeups(&mut self) -> mpsc::Receiver<()> {
        self.rx.take().expect("wakeups() called more than once")
    }
}

/// Fixed-interval poller used when native watching fails to initialize
/// (e.g. inotify instance limits exhausted).
pub struct PollingWatcher {
    path: PathBuf,
    interval: std::time::Duration,
}

impl PollingWatcher {
    pub fn new(path: PathBuf, interval: std::time::Duration) -> Self {
        Self { path, interval }
    }
}

impl FsWatcher for PollingWatcher {
    fn wakeups(&mut self) -> mpsc::Receiver<()> {
        let (tx, rx) = mpsc::channel(16);
        let path = self.path.clone();
        let interval = self.interval;
        tokio::spawn(async move {
            let mut last_modified = std::fs::metadata(&path).and_then(|m| m.modified()).ok();
            loop {
                tokio::time::sleep(interval).await;
                let Ok(current) = std::fs::metadata(&path).and_then(|m| m.modified()) else { continue };
                if Some(current) != last_modified {
                    last_modified = Some(current);
                    if tx.try_send(()).is_err() && tx.is_closed() {
                        break;
                    }
                }
            }
        });
        rx
    }
}

/// Opens a native watcher on `path`, falling back to polling when the OS
/// watch cannot be established.
pub fn watch_with_fallback(path: &Path, poll_interval: std::time::Duration) -> Box<dyn FsWatcher> {
    match NativeWatcher::watch(path) {
        Ok(watcher) => Box::new(watcher),
        Err(_) => Box::new(PollingWatcher::new(path.to_path_buf(), poll_interval)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn polling_watcher_wakes_on_modification() {
        let file = NamedTempFile::new().unwrap();
        let mut watcher = PollingWatcher::new(file.path().to_path_buf(), Duration::from_millis(10));
        let mut rx = watcher.wakeups();

        tokio::time::sleep(Duration::from_millis(20)).await;
        std::fs::write(file.path(), b"changed").unwrap();

        let woke = tokio::time::timeout(Duration::from_millis(200), rx.recv()).await;
        assert!(woke.is_ok());
    }
}
