// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory watcher adapters: discover matching files under a session's
//! watch directory, debounce bursts, and report cumulative counts.

mod fs;

pub use fs::FsWatcher;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeWatcher;

use async_trait::async_trait;
use cryoflow_core::{InputMode, SessionId};
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::broadcast;

#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("cannot watch {path}: {source}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session {0} is already being watched")]
    AlreadyWatching(SessionId),
}

/// One event surfaced by a [`Watcher`]. Delivered at-least-once; the
/// orchestrator's new-files handler is itself idempotent against duplicates
/// via MAX-semantics on `movies_found`.
#[derive(Debug, Clone)]
pub enum WatcherEvent {
    FilesAdded {
        session_id: SessionId,
        files: Vec<PathBuf>,
        count: u64,
    },
    NoFiles {
        session_id: SessionId,
    },
}

#[async_trait]
pub trait Watcher: Send + Sync + 'static {
    /// Begin watching `directory` for files matching `pattern`. Files are
    /// matched by extension, case-insensitively; dotfiles are ignored;
    /// subdirectories are scanned one level deep.
    async fn start(
        &self,
        session_id: SessionId,
        directory: PathBuf,
        pattern: String,
        input_mode: InputMode,
    ) -> Result<(), WatcherError>;

    /// Cancels timers and releases all per-session state. Idempotent.
    async fn stop(&self, session_id: &SessionId);

    /// Cumulative known-file count for a session, or 0 if not watched.
    fn file_count(&self, session_id: &SessionId) -> u64;

    /// Subscribe to this watcher's event stream. Each call returns an
    /// independent receiver fed by the same underlying watch loops.
    fn subscribe(&self) -> broadcast::Receiver<WatcherEvent>;
}
