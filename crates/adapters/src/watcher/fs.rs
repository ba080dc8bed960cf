// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real [`Watcher`] implementation: `notify` for OS-level change
//! notification, backstopped by an explicit stability poll so a missed or
//! coalesced event still converges on the next scan.

use super::{Watcher, WatcherError, WatcherEvent};
use async_trait::async_trait;
use cryoflow_core::{InputMode, SessionId};
use notify::{RecommendedWatcher, RecursiveMode, Watcher as _};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Notify};
use tokio::time::Instant;
use tracing::{debug, warn};

const WATCH_STABILITY_POLL: Duration = Duration::from_millis(500);
const WATCH_STABILITY_DURATION: Duration = Duration::from_secs(2);
const EXISTING_STABILITY_POLL: Duration = Duration::from_millis(200);
const EXISTING_STABILITY_DURATION: Duration = Duration::from_millis(500);
const WATCH_DEBOUNCE: Duration = Duration::from_secs(5);
const WATCH_RESCAN_INTERVAL: Duration = Duration::from_secs(1);

struct SessionHandle {
    stop: Arc<Notify>,
    known_count: Arc<AtomicU64>,
}

pub struct FsWatcher {
    tx: broadcast::Sender<WatcherEvent>,
    sessions: Arc<Mutex<HashMap<SessionId, SessionHandle>>>,
}

impl FsWatcher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1024);
        Self {
            tx,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for FsWatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Extension match against `pattern` (a comma-separated list of extensions,
/// e.g. `"tif,tiff,mrc"`), case-insensitive; dotfiles never match.
fn accepts(path: &Path, pattern: &str) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    pattern
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate.eq_ignore_ascii_case(ext))
}

/// Lists files directly under `dir` and one level into its subdirectories,
/// filtered by [`accepts`].
fn scan_one_level(dir: &Path, pattern: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_file() {
            if accepts(&path, pattern) {
                found.push(path);
            }
        } else if file_type.is_dir() {
            let Ok(sub_entries) = std::fs::read_dir(&path) else {
                continue;
            };
            for sub_entry in sub_entries.flatten() {
                let sub_path = sub_entry.path();
                if sub_entry.file_type().map(|t| t.is_file()).unwrap_or(false)
                    && accepts(&sub_path, pattern)
                {
                    found.push(sub_path);
                }
            }
        }
    }
    Ok(found)
}

/// Polls `path`'s size until it stops changing for `stable_for`, or returns
/// `false` if the file disappears first.
async fn wait_stable(path: &Path, poll: Duration, stable_for: Duration) -> bool {
    let mut last_len = match std::fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(_) => return false,
    };
    let mut stable_since = Instant::now();
    loop {
        tokio::time::sleep(poll).await;
        let len = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(_) => return false,
        };
        if len != last_len {
            last_len = len;
            stable_since = Instant::now();
            continue;
        }
        if stable_since.elapsed() >= stable_for {
            return true;
        }
    }
}

#[async_trait]
impl Watcher for FsWatcher {
    async fn start(
        &self,
        session_id: SessionId,
        directory: PathBuf,
        pattern: String,
        input_mode: InputMode,
    ) -> Result<(), WatcherError> {
        if self.sessions.lock().contains_key(&session_id) {
            return Err(WatcherError::AlreadyWatching(session_id));
        }
        std::fs::metadata(&directory).map_err(|source| WatcherError::DirectoryUnavailable {
            path: directory.clone(),
            source,
        })?;

        let stop = Arc::new(Notify::new());
        let known_count = Arc::new(AtomicU64::new(0));
        self.sessions.lock().insert(
            session_id.clone(),
            SessionHandle {
                stop: stop.clone(),
                known_count: known_count.clone(),
            },
        );

        let tx = self.tx.clone();
        let sessions = self.sessions.clone();

        match input_mode {
            InputMode::Existing => {
                tokio::spawn(async move {
                    run_existing_scan(&session_id, &directory, &pattern, &known_count, &tx).await;
                    sessions.lock().remove(&session_id);
                });
            }
            InputMode::Watch => {
                tokio::spawn(run_watch_loop(
                    session_id, directory, pattern, known_count, stop, tx,
                ));
            }
        }

        Ok(())
    }

    async fn stop(&self, session_id: &SessionId) {
        if let Some(handle) = self.sessions.lock().remove(session_id) {
            handle.stop.notify_one();
        }
    }

    fn file_count(&self, session_id: &SessionId) -> u64 {
        self.sessions
            .lock()
            .get(session_id)
            .map(|h| h.known_count.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    fn subscribe(&self) -> broadcast::Receiver<WatcherEvent> {
        self.tx.subscribe()
    }
}

async fn run_existing_scan(
    session_id: &SessionId,
    directory: &Path,
    pattern: &str,
    known_count: &AtomicU64,
    tx: &broadcast::Sender<WatcherEvent>,
) {
    let candidates = match scan_one_level(directory, pattern) {
        Ok(files) => files,
        Err(e) => {
            warn!(session_id = %session_id, error = %e, "existing-mode scan failed");
            let _ = tx.send(WatcherEvent::NoFiles {
                session_id: session_id.clone(),
            });
            return;
        }
    };

    let mut stable = Vec::new();
    for path in candidates {
        if wait_stable(&path, EXISTING_STABILITY_POLL, EXISTING_STABILITY_DURATION).await {
            stable.push(path);
        }
    }

    if stable.is_empty() {
        let _ = tx.send(WatcherEvent::NoFiles {
            session_id: session_id.clone(),
        });
        return;
    }

    let stable_count = stable.len() as u64;
    known_count.store(stable_count, Ordering::SeqCst);
    let _ = tx.send(WatcherEvent::FilesAdded {
        session_id: session_id.clone(),
        files: stable,
        count: stable_count,
    });
}

async fn run_watch_loop(
    session_id: SessionId,
    directory: PathBuf,
    pattern: String,
    known_count: Arc<AtomicU64>,
    stop: Arc<Notify>,
    tx: broadcast::Sender<WatcherEvent>,
) {
    let (rescan_tx, mut rescan_rx) = tokio::sync::mpsc::unbounded_channel::<()>();
    let _fs_watcher = spawn_fs_watcher(&directory, rescan_tx);

    let (stable_tx, mut stable_rx) = tokio::sync::mpsc::unbounded_channel::<PathBuf>();
    let mut known: HashSet<PathBuf> = HashSet::new();
    let mut checking: HashSet<PathBuf> = HashSet::new();
    let mut pending: Vec<PathBuf> = Vec::new();
    let mut debounce_deadline: Option<Instant> = None;
    let mut rescan_interval = tokio::time::interval(WATCH_RESCAN_INTERVAL);

    loop {
        let sleep_until_debounce = async {
            match debounce_deadline {
                Some(deadline) => tokio::time::sleep_until(deadline).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = stop.notified() => {
                debug!(session_id = %session_id, "watcher stopped");
                return;
            }
            _ = sleep_until_debounce => {
                if !pending.is_empty() {
                    let files = std::mem::take(&mut pending);
                    let _ = tx.send(WatcherEvent::FilesAdded {
                        session_id: session_id.clone(),
                        files,
                        count: known.len() as u64,
                    });
                }
                debounce_deadline = None;
            }
            Some(path) = stable_rx.recv() => {
                checking.remove(&path);
                if known.insert(path.clone()) {
                    known_count.store(known.len() as u64, Ordering::SeqCst);
                    pending.push(path);
                    debounce_deadline = Some(Instant::now() + WATCH_DEBOUNCE);
                }
            }
            _ = rescan_rx.recv() => {
                rescan(&directory, &pattern, &known, &mut checking, &stable_tx);
            }
            _ = rescan_interval.tick() => {
                rescan(&directory, &pattern, &known, &mut checking, &stable_tx);
            }
        }
    }
}

fn rescan(
    directory: &Path,
    pattern: &str,
    known: &HashSet<PathBuf>,
    checking: &mut HashSet<PathBuf>,
    stable_tx: &tokio::sync::mpsc::UnboundedSender<PathBuf>,
) {
    let found = match scan_one_level(directory, pattern) {
        Ok(files) => files,
        Err(e) => {
            warn!(error = %e, directory = %directory.display(), "watch-mode scan failed");
            return;
        }
    };
    for path in found {
        if known.contains(&path) || checking.contains(&path) {
            continue;
        }
        checking.insert(path.clone());
        let stable_tx = stable_tx.clone();
        tokio::spawn(async move {
            if wait_stable(&path, WATCH_STABILITY_POLL, WATCH_STABILITY_DURATION).await {
                let _ = stable_tx.send(path);
            }
        });
    }
}

/// Bridges `notify`'s callback thread into the async rescan loop. `notify`
/// only accelerates the next scan; the poll loop is the source of truth.
fn spawn_fs_watcher(
    directory: &Path,
    rescan_tx: tokio::sync::mpsc::UnboundedSender<()>,
) -> Option<RecommendedWatcher> {
    let mut watcher = match notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if res.is_ok() {
            let _ = rescan_tx.send(());
        }
    }) {
        Ok(w) => w,
        Err(e) => {
            warn!(error = %e, "failed to create notify watcher, relying on poll loop only");
            return None;
        }
    };
    if let Err(e) = watcher.watch(directory, RecursiveMode::Recursive) {
        warn!(error = %e, "failed to start notify watch, relying on poll loop only");
        return None;
    }
    Some(watcher)
}

#[cfg(test)]
#[path = "fs_tests.rs"]
mod tests;
