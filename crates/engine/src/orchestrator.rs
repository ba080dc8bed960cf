// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The facade a daemon or an in-process caller drives a live session
//! through: the Control API verbs (create/start/pause/resume/stop/delete/
//! get/stats/exposures/activity/list-by-project) plus the background event
//! loop that reacts to the watcher and the cluster driver.

use crate::error::OrchestratorError;
use crate::events::{self, EventJournal};
use crate::lifecycle;
use crate::pipeline::{self, FileRegistry};
use crate::registry::Registry;
use cryoflow_adapters::{ClusterDriver, Notifier, Watcher};
use cryoflow_core::{
    ActivityEntry, Clock, IdGen, InputMode, Project, ProjectId, Session, SessionConfig,
    SessionId, SessionState, UserId,
};
use cryoflow_storage::SessionStore;
use std::path::{Path, PathBuf};

/// Root paths the orchestrator needs but that live outside any one session
/// (each project's working tree sits under `projects_root/<project_id>`).
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub projects_root: PathBuf,
}

/// Ties one store/driver/watcher/notifier/clock/id-generator together into
/// the single object a daemon (or a test) drives a fleet of sessions through.
pub struct Orchestrator<Store, Driver, Watch, Notify, Clk, Ids> {
    store: Store,
    driver: Driver,
    watcher: Watch,
    notifier: Notify,
    clock: Clk,
    ids: Ids,
    registry: Registry,
    files: FileRegistry,
    config: OrchestratorConfig,
}

impl<Store, Driver, Watch, Notify, Clk, Ids> Orchestrator<Store, Driver, Watch, Notify, Clk, Ids>
where
    Store: SessionStore,
    Driver: ClusterDriver,
    Watch: Watcher,
    Notify: Notifier,
    Clk: Clock,
    Ids: IdGen,
{
    pub fn new(
        store: Store,
        driver: Driver,
        watcher: Watch,
        notifier: Notify,
        clock: Clk,
        ids: Ids,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            store,
            driver,
            watcher,
            notifier,
            clock,
            ids,
            registry: Registry::new(),
            files: FileRegistry::new(),
            config,
        }
    }

    fn project_dir(&self, project_id: &ProjectId) -> PathBuf {
        self.config.projects_root.join(project_id.as_str())
    }

    async fn load(&self, session_id: &SessionId) -> Result<Session, OrchestratorError> {
        self.store
            .get_session(session_id)
            .await?
            .ok_or_else(|| OrchestratorError::SessionNotFound(session_id.clone()))
    }

    /// Creates a new, not-yet-started session within an existing project.
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        session_name: impl Into<String>,
        input_mode: InputMode,
        watch_directory: PathBuf,
        file_pattern: impl Into<String>,
        config: SessionConfig,
    ) -> Result<Session, OrchestratorError> {
        if self.store.get_project(&project_id).await?.is_none() {
            return Err(OrchestratorError::ProjectNotFound(project_id));
        }
        let session_id = SessionId::new(self.ids.next());
        let now = self.clock.epoch_ms();
        let session = Session::new(
            session_id,
            project_id,
            user_id,
            session_name,
            input_mode,
            watch_directory,
            file_pattern,
            config,
            now,
        );
        self.store.insert_session(session.clone()).await?;
        Ok(session)
    }

    pub async fn start(&self, session_id: &SessionId) -> Result<(), OrchestratorError> {
        lifecycle::start(
            &self.store,
            &self.watcher,
            &self.notifier,
            &self.clock,
            &self.config.projects_root,
            session_id,
        )
        .await
    }

    pub async fn pause(&self, session_id: &SessionId) -> Result<(), OrchestratorError> {
        lifecycle::pause(&self.store, &self.watcher, &self.notifier, &self.clock, session_id).await
    }

    /// Resumes a paused session and immediately runs one pipeline pass so a
    /// stage that was paused on failure is resubmitted without waiting for
    /// the next file or cluster event.
    pub async fn resume(&self, session_id: &SessionId) -> Result<(), OrchestratorError> {
        lifecycle::resume(
            &self.store,
            &self.watcher,
            &self.notifier,
            &self.clock,
            &self.config.projects_root,
            session_id,
        )
        .await?;
        let session = self.load(session_id).await?;
        let project_dir = self.project_dir(&session.project_id);
        pipeline::trigger_pipeline_pass(
            &self.registry,
            &self.store,
            &self.driver,
            &self.notifier,
            &self.clock,
            &self.ids,
            &self.files,
            &project_dir,
            session_id,
        )
        .await
    }

    pub async fn stop(&self, session_id: &SessionId) -> Result<(), OrchestratorError> {
        lifecycle::stop(
            &self.store,
            &self.driver,
            &self.watcher,
            &self.notifier,
            &self.clock,
            &self.config.projects_root,
            session_id,
        )
        .await
    }

    /// Stops (if live), cascades-deletes its job records, then drops the
    /// session itself; also forgets any files the watcher had accumulated
    /// for it in-process.
    pub async fn delete(&self, session_id: &SessionId) -> Result<(), OrchestratorError> {
        lifecycle::delete(
            &self.store,
            &self.driver,
            &self.watcher,
            &self.notifier,
            &self.clock,
            &self.config.projects_root,
            session_id,
        )
        .await?;
        self.files.remove(session_id);
        self.registry.remove(session_id);
        Ok(())
    }

    pub async fn get(&self, session_id: &SessionId) -> Result<Session, OrchestratorError> {
        self.load(session_id).await
    }

    /// Rolled-up pipeline progress counters for one session.
    pub async fn stats(&self, session_id: &SessionId) -> Result<SessionState, OrchestratorError> {
        Ok(self.load(session_id).await?.state)
    }

    /// The raw exposures (movie files) the watcher has handed this session
    /// so far, in arrival order. Process-local: lost across a restart, same
    /// as the rest of [`FileRegistry`]'s accumulation.
    pub async fn exposures(&self, session_id: &SessionId) -> Result<Vec<PathBuf>, OrchestratorError> {
        self.load(session_id).await?;
        Ok(self.files.snapshot(session_id))
    }

    pub async fn activity(&self, session_id: &SessionId) -> Result<Vec<ActivityEntry>, OrchestratorError> {
        Ok(self.load(session_id).await?.activity_log)
    }

    pub async fn list_by_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<Session>, OrchestratorError> {
        Ok(self.store.list_sessions_for_project(project_id).await?)
    }

    pub async fn create_project(
        &self,
        project_id: ProjectId,
        name: impl Into<String>,
    ) -> Result<(), OrchestratorError> {
        Ok(self.store.insert_project(Project::new(project_id, name)).await?)
    }

    /// Crash recovery: cancels every orphaned in-flight job and restarts the
    /// watcher for every session left `running` at the last clean shutdown.
    pub async fn resume_after_restart(&self) -> Result<Vec<SessionId>, OrchestratorError> {
        lifecycle::resume_running_after_restart(&self.store, &self.driver, &self.watcher, &self.clock).await
    }

    /// Runs the single event loop merging the watcher's and the cluster
    /// driver's broadcast streams until both are closed. Never returns
    /// under normal operation; the caller spawns this as a background task.
    pub async fn run_events<Journal: EventJournal>(&self, journal: &Journal) {
        events::run(
            &self.registry,
            &self.store,
            &self.driver,
            &self.watcher,
            &self.notifier,
            &self.clock,
            &self.ids,
            &self.files,
            &self.config.projects_root,
            journal,
        )
        .await
    }

    pub fn project_path(&self, project_id: &ProjectId) -> PathBuf {
        self.project_dir(project_id)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
