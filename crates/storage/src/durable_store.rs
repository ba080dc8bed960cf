// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WAL + snapshot backed [`SessionStore`](crate::SessionStore).
//!
//! Cross-component events ([`Event::FilesAdded`], [`Event::JobStatusChanged`])
//! are durably WAL-logged and applied before the engine's event loop acts on
//! them, so a crash between the two replays the event on restart (see
//! [`DurableSessionStore::record_event`]). The richer document mutations the
//! orchestrator performs afterward (activity log, pass history, job slot
//! assignment, ...) are not themselves event-sourced; each one instead
//! refreshes a full on-disk snapshot, which is cheap at this orchestrator's
//! call rates and keeps a single recovery path: load the latest snapshot,
//! then replay whatever WAL entries landed after its sequence number.

use crate::ops::StateBackend;
use crate::snapshot::Snapshot;
use crate::state::MaterializedState;
use crate::store::StoreError;
use crate::wal::Wal;
use cryoflow_core::Event;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use tracing::info;

pub struct DurableSessionStore {
    state: Mutex<MaterializedState>,
    wal: Mutex<Wal>,
    snapshot_path: PathBuf,
}

impl DurableSessionStore {
    /// Open (or create) durable storage rooted at `dir`, loading the latest
    /// snapshot and replaying any WAL entries written after it.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let snapshot_path = dir.join("snapshot.json");
        let wal_path = dir.join("wal.jsonl");

        let snapshot = Snapshot::load(&snapshot_path)?;
        let (mut state, processed_seq) = match snapshot {
            Some(s) => (s.state, s.seq),
            None => (MaterializedState::default(), 0),
        };

        let mut wal = Wal::open(&wal_path, processed_seq)?;
        let replayed = wal.entries_after(processed_seq)?;
        for entry in &replayed {
            state.apply_event(&entry.event);
            wal.mark_processed(entry.seq);
        }
        if !replayed.is_empty() {
            info!(count = replayed.len(), "replayed WAL entries on startup");
        }

        let store = Self {
            state: Mutex::new(state),
            wal: Mutex::new(wal),
            snapshot_path,
        };
        if !replayed.is_empty() {
            store.persist()?;
        }
        Ok(store)
    }

    /// Durably log and apply a cross-component event, returning its assigned
    /// sequence number. Must be called before the orchestrator acts on the
    /// event so recovery can replay anything lost mid-processing.
    pub fn record_event(&self, event: &Event) -> Result<u64, StoreError> {
        let seq = {
            let mut wal = self.wal.lock();
            let seq = wal.append(event)?;
            wal.flush()?;
            wal.mark_processed(seq);
            seq
        };
        self.state.lock().apply_event(event);
        self.persist()?;
        Ok(seq)
    }

    fn persist(&self) -> Result<(), StoreError> {
        let seq = self.wal.lock().processed_seq();
        let state = self.state.lock().clone();
        Snapshot::new(seq, state).save(&self.snapshot_path)?;
        Ok(())
    }
}

impl StateBackend for DurableSessionStore {
    fn read<R>(&self, f: impl FnOnce(&MaterializedState) -> R) -> R {
        f(&self.state.lock())
    }

    fn write<R>(&self, f: impl FnOnce(&mut MaterializedState) -> R) -> R {
        f(&mut self.state.lock())
    }

    fn on_mutated(&self) -> Result<(), StoreError> {
        self.persist()
    }
}

#[cfg(test)]
#[path = "durable_store_tests.rs"]
mod tests;
