// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup: acquire the single-instance lock, open durable storage,
//! wire the real adapters, build the orchestrator, and resume sessions left
//! running across a restart.

use crate::config::Config;
use cryoflow_adapters::cluster::SlurmClusterDriver;
use cryoflow_adapters::notifier::BroadcastNotifier;
use cryoflow_adapters::watcher::FsWatcher;
use cryoflow_core::{Event, SystemClock, UuidIdGen};
use cryoflow_engine::{EventJournal, Orchestrator, OrchestratorConfig, OrchestratorError};
use cryoflow_storage::DurableSessionStore;
use fs2::FileExt;
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::info;

pub type DaemonOrchestrator =
    Orchestrator<DurableSessionStore, SlurmClusterDriver, FsWatcher, BroadcastNotifier, SystemClock, UuidIdGen>;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,
    #[error("failed to acquire lock at {0}: daemon already running?")]
    LockFailed(PathBuf, #[source] std::io::Error),
    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),
    #[error("store error: {0}")]
    Store(#[from] cryoflow_storage::StoreError),
    #[error("orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Local newtype so the foreign [`EventJournal`] trait can be implemented for
/// the foreign [`DurableSessionStore`] type without violating orphan rules.
pub struct StoreJournal<'a>(pub &'a DurableSessionStore);

impl EventJournal for StoreJournal<'_> {
    fn record(&self, event: &Event) -> Result<(), OrchestratorError> {
        self.0
            .record_event(event)
            .map(|_| ())
            .map_err(OrchestratorError::from)
    }
}

/// Holds the exclusive advisory lock for the process lifetime; the lock is
/// released when this (and the underlying file) is dropped.
pub struct DaemonLock {
    #[allow(dead_code)]
    file: File,
}

fn acquire_lock(lock_path: &PathBuf) -> Result<DaemonLock, LifecycleError> {
    let file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)?;
    file.try_lock_exclusive()
        .map_err(|err| LifecycleError::LockFailed(lock_path.clone(), err))?;
    let mut file = file;
    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;
    Ok(DaemonLock { file })
}

pub struct StartupResult {
    pub lock: DaemonLock,
    pub orchestrator: DaemonOrchestrator,
    pub listener: UnixListener,
    pub resumed: Vec<cryoflow_core::SessionId>,
}

pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;
    std::fs::create_dir_all(&config.projects_root)?;

    let lock = acquire_lock(&config.lock_path)?;

    let store = DurableSessionStore::open(&config.store_dir)?;
    let driver = SlurmClusterDriver::new();
    let watcher = FsWatcher::new();
    let notifier = BroadcastNotifier::new();
    let clock = SystemClock;
    let ids = UuidIdGen::default();

    let orchestrator = Orchestrator::new(
        store,
        driver,
        watcher,
        notifier,
        clock,
        ids,
        OrchestratorConfig { projects_root: config.projects_root.clone() },
    );

    let resumed = orchestrator.resume_after_restart().await?;
    info!(resumed = resumed.len(), "resumed sessions after restart");

    if let Some(parent) = config.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = std::fs::remove_file(&config.socket_path);
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|err| LifecycleError::BindFailed(config.socket_path.clone(), err))?;

    Ok(StartupResult { lock, orchestrator, listener, resumed })
}

pub fn shutdown(config: &Config) {
    let _ = std::fs::remove_file(&config.socket_path);
    let _ = std::fs::remove_file(&config.lock_path);
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
