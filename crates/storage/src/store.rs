// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document-oriented persistence surface for sessions, jobs, and projects.
//!
//! Mirrors a document-store API deliberately rather than a relational one:
//! find/find-one by id, atomic single-field set, `$max` for monotonic
//! counters, `$push` for ordered appends, and a disjunction query to locate
//! the session owning a completed cluster job.

use async_trait::async_trait;
use cryoflow_core::{
    ActivityEntry, ExecutionMode, Job, JobId, PassSnapshot, PipelineStats, Project, ProjectId,
    Session, SessionId, SessionState, SessionStatus, StageKey,
};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),
    #[error("job not found: {0}")]
    JobNotFound(JobId),
    #[error("project not found: {0}")]
    ProjectNotFound(ProjectId),
    #[error("session already exists: {0}")]
    SessionExists(SessionId),
    #[error("job already exists: {0}")]
    JobExists(JobId),
    #[error("project already exists: {0}")]
    ProjectExists(ProjectId),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("wal error: {0}")]
    Wal(#[from] crate::wal::WalError),
    #[error("snapshot error: {0}")]
    Snapshot(#[from] crate::snapshot::SnapshotError),
}

/// A fresh job record to create as part of stage submission.
#[derive(Debug, Clone)]
pub struct NewJob {
    pub id: JobId,
    pub project_id: ProjectId,
    pub user_id: cryoflow_core::UserId,
    pub session_id: SessionId,
    pub job_name: String,
    pub job_type: StageKey,
    pub output_dir: std::path::PathBuf,
    pub command: String,
    pub parameters: HashMap<String, String>,
    pub input_job_ids: Vec<JobId>,
    pub execution_mode: ExecutionMode,
    pub created_at_ms: u64,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    // -- sessions --
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError>;
    async fn insert_session(&self, session: Session) -> Result<(), StoreError>;
    async fn delete_session(&self, id: &SessionId) -> Result<(), StoreError>;
    async fn list_sessions_with_status(
        &self,
        status: SessionStatus,
    ) -> Result<Vec<Session>, StoreError>;
    async fn list_sessions_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<Session>, StoreError>;

    /// Disjunction query: find the session whose `jobs.*` slot references `job_id`.
    async fn find_session_by_job_id(&self, job_id: &JobId) -> Result<Option<Session>, StoreError>;

    async fn set_session_status(
        &self,
        id: &SessionId,
        status: SessionStatus,
    ) -> Result<(), StoreError>;
    async fn set_session_state(&self, id: &SessionId, state: SessionState)
        -> Result<(), StoreError>;
    async fn set_session_job_slot(
        &self,
        id: &SessionId,
        stage: StageKey,
        job_id: JobId,
    ) -> Result<(), StoreError>;
    async fn set_session_start_time(&self, id: &SessionId, epoch_ms: u64) -> Result<(), StoreError>;
    async fn set_session_end_time(&self, id: &SessionId, epoch_ms: u64) -> Result<(), StoreError>;

    /// `$max` update: raises `state.movies_found` to `candidate` unless it is already higher.
    async fn raise_movies_found(&self, id: &SessionId, candidate: u64) -> Result<(), StoreError>;

    /// `$push` update onto `pass_history`.
    async fn push_pass_snapshot(
        &self,
        id: &SessionId,
        snapshot: PassSnapshot,
    ) -> Result<(), StoreError>;

    /// `$push` update onto `activity_log`.
    async fn push_activity(&self, id: &SessionId, entry: ActivityEntry) -> Result<(), StoreError>;

    // -- jobs --
    async fn get_job(&self, id: &JobId) -> Result<Option<Job>, StoreError>;
    async fn insert_job(&self, job: NewJob) -> Result<(), StoreError>;
    async fn mark_job_running(&self, id: &JobId, epoch_ms: u64) -> Result<(), StoreError>;
    async fn mark_job_success(
        &self,
        id: &JobId,
        epoch_ms: u64,
        stats: PipelineStats,
    ) -> Result<(), StoreError>;
    async fn mark_job_failed(
        &self,
        id: &JobId,
        epoch_ms: u64,
        error_message: String,
    ) -> Result<(), StoreError>;
    async fn mark_job_cancelled(&self, id: &JobId, epoch_ms: u64) -> Result<(), StoreError>;
    async fn set_job_cluster_id(&self, id: &JobId, cluster_job_id: String)
        -> Result<(), StoreError>;
    async fn reset_job_for_rerun(
        &self,
        id: &JobId,
        command: String,
        parameters: HashMap<String, String>,
    ) -> Result<(), StoreError>;
    async fn delete_jobs_for_session(&self, session_id: &SessionId) -> Result<(), StoreError>;
    async fn list_jobs_for_session(&self, session_id: &SessionId) -> Result<Vec<Job>, StoreError>;

    // -- projects --
    async fn get_project(&self, id: &ProjectId) -> Result<Option<Project>, StoreError>;
    async fn insert_project(&self, project: Project) -> Result<(), StoreError>;
    /// Atomically allocates and returns the next project-unique job name.
    async fn allocate_job_name(&self, project_id: &ProjectId) -> Result<String, StoreError>;
    /// Resolves job names to ids within a project (for `input_job_ids`).
    async fn resolve_job_ids_by_name(
        &self,
        project_id: &ProjectId,
        names: &[String],
    ) -> Result<Vec<JobId>, StoreError>;
}
