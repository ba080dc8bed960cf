// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`Watcher`] double: tests push events directly instead of
//! waiting on real filesystem timing.

use super::{Watcher, WatcherError, WatcherEvent};
use async_trait::async_trait;
use cryoflow_core::{InputMode, SessionId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub struct StartCall {
    pub session_id: SessionId,
    pub directory: PathBuf,
    pub pattern: String,
    pub input_mode: InputMode,
}

pub struct FakeWatcher {
    tx: broadcast::Sender<WatcherEvent>,
    started: Mutex<Vec<StartCall>>,
    counts: Mutex<HashMap<SessionId, u64>>,
    stopped: Mutex<Vec<SessionId>>,
}

impl FakeWatcher {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self {
            tx,
            started: Mutex::new(Vec::new()),
            counts: Mutex::new(HashMap::new()),
            stopped: Mutex::new(Vec::new()),
        }
    }

    pub fn started_calls(&self) -> Vec<StartCall> {
        self.started.lock().clone()
    }

    pub fn stopped_sessions(&self) -> Vec<SessionId> {
        self.stopped.lock().clone()
    }

    /// Pushes a `files-added` event and updates the count returned by
    /// [`Watcher::file_count`].
    pub fn push_files_added(&self, session_id: SessionId, files: Vec<PathBuf>) {
        let count = files.len() as u64;
        self.counts.lock().insert(session_id.clone(), count);
        let _ = self.tx.send(WatcherEvent::FilesAdded {
            session_id,
            files,
            count,
        });
    }

    pub fn push_no_files(&self, session_id: SessionId) {
        let _ = self.tx.send(WatcherEvent::NoFiles { session_id });
    }

    pub fn set_count(&self, session_id: SessionId, count: u64) {
        self.counts.lock().insert(session_id, count);
    }
}

impl Default for FakeWatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Watcher for FakeWatcher {
    async fn start(
        &self,
        session_id: SessionId,
        directory: PathBuf,
        pattern: String,
        input_mode: InputMode,
    ) -> Result<(), WatcherError> {
        self.started.lock().push(StartCall {
            session_id,
            directory,
            pattern,
            input_mode,
        });
        Ok(())
    }

    async fn stop(&self, session_id: &SessionId) {
        self.stopped.lock().push(session_id.clone());
        self.counts.lock().remove(session_id);
    }

    fn file_count(&self, session_id: &SessionId) -> u64 {
        self.counts.lock().get(session_id).copied().unwrap_or(0)
    }

    fn subscribe(&self) -> broadcast::Receiver<WatcherEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
