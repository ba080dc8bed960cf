// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle transitions: start, pause, resume, stop, delete, and
//! restart-time resumption of sessions left running at the last clean
//! shutdown.

use crate::error::OrchestratorError;
use cryoflow_adapters::{symlink, ClusterDriver, Notifier, Watcher};
use cryoflow_core::{ActivityEntry, ActivityLevel, Clock, Session, SessionId, SessionStatus};
use cryoflow_storage::SessionStore;
use serde_json::json;
use std::path::{Path, PathBuf};

pub(crate) fn project_path(projects_root: &Path, project_id: &cryoflow_core::ProjectId) -> PathBuf {
    projects_root.join(project_id.as_str())
}

async fn load<Store: SessionStore>(
    store: &Store,
    session_id: &SessionId,
) -> Result<Session, OrchestratorError> {
    store
        .get_session(session_id)
        .await?
        .ok_or_else(|| OrchestratorError::SessionNotFound(session_id.clone()))
}

async fn emit<Notify: Notifier, Store: SessionStore>(
    store: &Store,
    notifier: &Notify,
    session: &Session,
    event: &str,
    level: ActivityLevel,
    message: impl Into<String>,
    now_ms: u64,
) -> Result<(), OrchestratorError> {
    let message = message.into();
    store
        .push_activity(&session.id, ActivityEntry { level, message: message.clone(), created_at_ms: now_ms, context: None })
        .await?;
    notifier.publish(
        &session.project_id,
        cryoflow_adapters::LiveUpdate {
            session_id: session.id.clone(),
            event: event.to_string(),
            level,
            data: json!({ "message": message }),
            timestamp_ms: now_ms,
        },
    );
    Ok(())
}

/// Starts or restarts a session: creates the project-relative watch-directory
/// symlink, starts the watcher, and marks the session running.
pub async fn start<Store, Watch, Notify, Clk>(
    store: &Store,
    watcher: &Watch,
    notifier: &Notify,
    clock: &Clk,
    projects_root: &Path,
    session_id: &SessionId,
) -> Result<(), OrchestratorError>
where
    Store: SessionStore,
    Watch: Watcher,
    Notify: Notifier,
    Clk: Clock,
{
    let session = load(store, session_id).await?;
    if session.status == SessionStatus::Running {
        return Ok(());
    }
    if session.status.is_terminal() {
        return Err(OrchestratorError::InvalidState(
            session_id.clone(),
            "session already stopped or completed",
        ));
    }

    let project_dir = project_path(projects_root, &session.project_id);
    symlink::create_project_symlink(&project_dir, &session.session_name, &session.watch_directory)?;

    watcher
        .start(
            session.id.clone(),
            session.watch_directory.clone(),
            session.file_pattern.clone(),
            session.input_mode,
        )
        .await?;

    let now = clock.epoch_ms();
    store.set_session_status(session_id, SessionStatus::Running).await?;
    if session.start_time_ms.is_none() {
        store.set_session_start_time(session_id, now).await?;
    }
    emit(store, notifier, &session, "session_started", ActivityLevel::Info, "session started", now).await
}

/// Pauses a running session: stops the watcher so no new files are picked up,
/// but leaves any in-flight cluster jobs running.
pub async fn pause<Store, Watch, Notify, Clk>(
    store: &Store,
    watcher: &Watch,
    notifier: &Notify,
    clock: &Clk,
    session_id: &SessionId,
) -> Result<(), OrchestratorError>
where
    Store: SessionStore,
    Watch: Watcher,
    Notify: Notifier,
    Clk: Clock,
{
    let session = load(store, session_id).await?;
    if session.status != SessionStatus::Running {
        return Err(OrchestratorError::InvalidState(session_id.clone(), "session is not running"));
    }
    watcher.stop(session_id).await;
    let now = clock.epoch_ms();
    store.set_session_status(session_id, SessionStatus::Paused).await?;
    emit(store, notifier, &session, "session_paused", ActivityLevel::Info, "session paused", now).await
}

/// Resumes a paused session: identical to [`start`] but requires the prior
/// status to have been `paused` rather than `pending`.
pub async fn resume<Store, Watch, Notify, Clk>(
    store: &Store,
    watcher: &Watch,
    notifier: &Notify,
    clock: &Clk,
    projects_root: &Path,
    session_id: &SessionId,
) -> Result<(), OrchestratorError>
where
    Store: SessionStore,
    Watch: Watcher,
    Notify: Notifier,
    Clk: Clock,
{
    let session = load(store, session_id).await?;
    if session.status != SessionStatus::Paused {
        return Err(OrchestratorError::InvalidState(session_id.clone(), "session is not paused"));
    }
    start(store, watcher, notifier, clock, projects_root, session_id).await
}

/// Stops a session permanently: cancels every in-flight job best-effort,
/// stops the watcher, removes the project symlink, and marks the session
/// stopped. Idempotent once the session is already stopped.
pub async fn stop<Store, Driver, Watch, Notify, Clk>(
    store: &Store,
    driver: &Driver,
    watcher: &Watch,
    notifier: &Notify,
    clock: &Clk,
    projects_root: &Path,
    session_id: &SessionId,
) -> Result<(), OrchestratorError>
where
    Store: SessionStore,
    Driver: ClusterDriver,
    Watch: Watcher,
    Notify: Notifier,
    Clk: Clock,
{
    let session = load(store, session_id).await?;
    if session.status == SessionStatus::Stopped {
        return Ok(());
    }

    watcher.stop(session_id).await;

    let now = clock.epoch_ms();
    for job in store.list_jobs_for_session(session_id).await? {
        if !job.status.is_in_flight() {
            continue;
        }
        if let Some(cluster_job_id) = &job.cluster_job_id {
            // best-effort: a scheduler that already finished the job is not an error.
            let _ = driver.cancel(cluster_job_id).await;
        }
        store.mark_job_cancelled(&job.id, now).await?;
    }

    let project_dir = project_path(projects_root, &session.project_id);
    let _ = symlink::remove_project_symlink(&project_dir, &session.session_name);

    store.set_session_status(session_id, SessionStatus::Stopped).await?;
    store.set_session_end_time(session_id, now).await?;
    emit(store, notifier, &session, "session_stopped", ActivityLevel::Info, "session stopped", now).await
}

/// Deletes a session and its job records. Stops it first if still live.
pub async fn delete<Store, Driver, Watch, Notify, Clk>(
    store: &Store,
    driver: &Driver,
    watcher: &Watch,
    notifier: &Notify,
    clock: &Clk,
    projects_root: &Path,
    session_id: &SessionId,
) -> Result<(), OrchestratorError>
where
    Store: SessionStore,
    Driver: ClusterDriver,
    Watch: Watcher,
    Notify: Notifier,
    Clk: Clock,
{
    let session = load(store, session_id).await?;
    if matches!(session.status, SessionStatus::Running | SessionStatus::Paused) {
        stop(store, driver, watcher, notifier, clock, projects_root, session_id).await?;
    }
    store.delete_jobs_for_session(session_id).await?;
    store.delete_session(session_id).await?;
    Ok(())
}

/// Restarts every session the store still lists as `running` after an
/// unclean process exit: any job still in flight for that session is an
/// orphan left behind by the crash, so it is cancelled before the watcher
/// restarts, the same way [`stop`] cancels live jobs on a deliberate stop.
pub async fn resume_running_after_restart<Store, Driver, Watch, Clk>(
    store: &Store,
    driver: &Driver,
    watcher: &Watch,
    clock: &Clk,
) -> Result<Vec<SessionId>, OrchestratorError>
where
    Store: SessionStore,
    Driver: ClusterDriver,
    Watch: Watcher,
    Clk: Clock,
{
    let mut resumed = Vec::new();
    let now = clock.epoch_ms();
    for session in store.list_sessions_with_status(SessionStatus::Running).await? {
        for job in store.list_jobs_for_session(&session.id).await? {
            if !job.status.is_in_flight() {
                continue;
            }
            if let Some(cluster_job_id) = &job.cluster_job_id {
                let _ = driver.cancel(cluster_job_id).await;
            }
            store.mark_job_cancelled(&job.id, now).await?;
        }

        match watcher
            .start(
                session.id.clone(),
                session.watch_directory.clone(),
                session.file_pattern.clone(),
                session.input_mode,
            )
            .await
        {
            Ok(()) => resumed.push(session.id),
            Err(err) => {
                tracing::warn!(session_id = %session.id, error = %err, "failed to restart watcher after restart");
            }
        }
    }
    Ok(resumed)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
