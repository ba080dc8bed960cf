// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single event loop merging the watcher's and the cluster driver's
//! broadcast streams into the pipeline handlers.
//!
//! Cross-component events are durably logged through an [`EventJournal`]
//! before the matching pipeline handler runs, so a crash between the two
//! can replay the event on restart. [`NullJournal`] is the right choice
//! wherever the backing store isn't WAL-backed (tests, an in-memory store);
//! a WAL-backed store wires its own [`EventJournal`] impl in.

use crate::error::OrchestratorError;
use crate::pipeline::{self, FileRegistry};
use crate::registry::Registry;
use cryoflow_adapters::{ClusterDriver, Notifier, StatusChange, Watcher, WatcherEvent};
use cryoflow_core::{Clock, Event, IdGen, InputMode};
use cryoflow_storage::SessionStore;
use std::path::Path;
use tracing::{error, warn};

/// Durably records a cross-component event ahead of the orchestrator acting
/// on it. Implementations must be cheap to call on every event.
pub trait EventJournal: Send + Sync {
    fn record(&self, event: &Event) -> Result<(), OrchestratorError>;
}

/// No-op journal for stores that aren't WAL-backed.
pub struct NullJournal;

impl EventJournal for NullJournal {
    fn record(&self, _event: &Event) -> Result<(), OrchestratorError> {
        Ok(())
    }
}

/// Runs until both streams close. A handler error for one session is logged
/// and the loop continues; it never aborts the whole orchestrator over a
/// single session's persistence failure.
#[allow(clippy::too_many_arguments)]
pub async fn run<Store, Driver, Watch, Notify, Clk, Ids, Journal>(
    registry: &Registry,
    store: &Store,
    driver: &Driver,
    watcher: &Watch,
    notifier: &Notify,
    clock: &Clk,
    ids: &Ids,
    files: &FileRegistry,
    projects_root: &Path,
    journal: &Journal,
) where
    Store: SessionStore,
    Driver: ClusterDriver,
    Watch: Watcher,
    Notify: Notifier,
    Clk: Clock,
    Ids: IdGen,
    Journal: EventJournal,
{
    let mut watcher_rx = watcher.subscribe();
    let mut driver_rx = driver.subscribe();

    loop {
        tokio::select! {
            event = watcher_rx.recv() => {
                match event {
                    Ok(event) => {
                        if let Err(err) = handle_watcher_event(
                            registry, store, driver, notifier, clock, ids, files, projects_root, journal, event,
                        ).await {
                            error!(error = %err, "failed to handle watcher event");
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "watcher event stream lagged");
                    }
                }
            }
            event = driver_rx.recv() => {
                match event {
                    Ok(event) => {
                        if let Err(err) = handle_status_change(
                            registry, store, driver, notifier, clock, ids, files, projects_root, journal, event,
                        ).await {
                            error!(error = %err, "failed to handle cluster status change");
                        }
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "cluster status stream lagged");
                    }
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_watcher_event<Store, Driver, Notify, Clk, Ids, Journal>(
    registry: &Registry,
    store: &Store,
    driver: &Driver,
    notifier: &Notify,
    clock: &Clk,
    ids: &Ids,
    files: &FileRegistry,
    projects_root: &Path,
    journal: &Journal,
    event: WatcherEvent,
) -> Result<(), OrchestratorError>
where
    Store: SessionStore,
    Driver: ClusterDriver,
    Notify: Notifier,
    Clk: Clock,
    Ids: IdGen,
    Journal: EventJournal,
{
    match event {
        WatcherEvent::FilesAdded { session_id, files: batch, count } => {
            let Some(session) = store.get_session(&session_id).await? else {
                return Ok(());
            };
            journal.record(&Event::FilesAdded {
                session_id: session_id.clone(),
                files: batch.clone(),
                count,
            })?;
            let project_dir = projects_root.join(session.project_id.as_str());
            pipeline::on_files_added(
                registry, store, driver, notifier, clock, ids, files, &project_dir,
                &session_id, batch, count,
            )
            .await
        }
        WatcherEvent::NoFiles { session_id } => {
            let Some(session) = store.get_session(&session_id).await? else {
                return Ok(());
            };
            if session.input_mode != InputMode::Existing {
                return Ok(());
            }
            journal.record(&Event::NoFiles {
                session_id: session_id.clone(),
                directory: session.watch_directory.clone(),
            })?;
            pipeline::on_no_files(store, notifier, clock, &session_id).await
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_status_change<Store, Driver, Notify, Clk, Ids, Journal>(
    registry: &Registry,
    store: &Store,
    driver: &Driver,
    notifier: &Notify,
    clock: &Clk,
    ids: &Ids,
    files: &FileRegistry,
    projects_root: &Path,
    journal: &Journal,
    change: StatusChange,
) -> Result<(), OrchestratorError>
where
    Store: SessionStore,
    Driver: ClusterDriver,
    Notify: Notifier,
    Clk: Clock,
    Ids: IdGen,
    Journal: EventJournal,
{
    let Some(session) = store.find_session_by_job_id(&change.job_id).await? else {
        return Ok(());
    };
    journal.record(&Event::JobStatusChanged {
        job_id: change.job_id.clone(),
        status: change.status,
        cluster_job_id: Some(change.cluster_job_id.clone()),
    })?;
    let project_dir = projects_root.join(session.project_id.as_str());
    pipeline::on_status_change(
        registry, store, driver, notifier, clock, ids, files, &project_dir,
        &change.job_id, &change.cluster_job_id, change.status,
    )
    .await
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
