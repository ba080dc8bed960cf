// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared [`SessionStore`] mutation logic over a [`MaterializedState`].
//!
//! Both the in-memory and WAL/snapshot-backed stores need the same document
//! mutations; they differ only in how state is locked and what happens once
//! a write completes. [`StateBackend`] captures that difference and this
//! module supplies a single blanket [`SessionStore`] impl over it.

use crate::state::MaterializedState;
use crate::store::{NewJob, SessionStore, StoreError};
use async_trait::async_trait;
use cryoflow_core::{
    ActivityEntry, Job, JobConfig, JobId, JobStatus, PassSnapshot, PipelineStats, Project,
    ProjectId, Session, SessionId, SessionState, SessionStatus, StageKey,
};
use std::collections::HashMap;

pub(crate) trait StateBackend: Send + Sync {
    fn read<R>(&self, f: impl FnOnce(&MaterializedState) -> R) -> R;
    fn write<R>(&self, f: impl FnOnce(&mut MaterializedState) -> R) -> R;

    /// Runs after a mutating call completes, with nothing locked.
    /// The in-memory backend is a no-op; the durable backend snapshots.
    fn on_mutated(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl<T: StateBackend> SessionStore for T {
    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.read(|s| s.sessions.get(id.as_str()).cloned()))
    }

    async fn insert_session(&self, session: Session) -> Result<(), StoreError> {
        self.write(|s| -> Result<(), StoreError> {
            if s.sessions.contains_key(session.id.as_str()) {
                return Err(StoreError::SessionExists(session.id.clone()));
            }
            s.sessions.insert(session.id.as_str().to_string(), session);
            Ok(())
        })?;
        self.on_mutated()
    }

    async fn delete_session(&self, id: &SessionId) -> Result<(), StoreError> {
        self.write(|s| -> Result<(), StoreError> {
            if s.sessions.remove(id.as_str()).is_none() {
                return Err(StoreError::SessionNotFound(id.clone()));
            }
            Ok(())
        })?;
        self.on_mutated()
    }

    async fn list_sessions_with_status(
        &self,
        status: SessionStatus,
    ) -> Result<Vec<Session>, StoreError> {
        Ok(self.read(|s| {
            s.sessions
                .values()
                .filter(|sess| sess.status == status)
                .cloned()
                .collect()
        }))
    }

    async fn list_sessions_for_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<Session>, StoreError> {
        Ok(self.read(|s| {
            s.sessions
                .values()
                .filter(|sess| &sess.project_id == project_id)
                .cloned()
                .collect()
        }))
    }

    async fn find_session_by_job_id(&self, job_id: &JobId) -> Result<Option<Session>, StoreError> {
        Ok(self.read(|s| s.find_session_by_job_id(job_id.as_str()).cloned()))
    }

    async fn set_session_status(
        &self,
        id: &SessionId,
        status: SessionStatus,
    ) -> Result<(), StoreError> {
        self.write(|s| -> Result<(), StoreError> {
            let session = s
                .sessions
                .get_mut(id.as_str())
                .ok_or_else(|| StoreError::SessionNotFound(id.clone()))?;
            session.status = status;
            Ok(())
        })?;
        self.on_mutated()
    }

    async fn set_session_state(
        &self,
        id: &SessionId,
        state: SessionState,
    ) -> Result<(), StoreError> {
        self.write(|s| -> Result<(), StoreError> {
            let session = s
                .sessions
                .get_mut(id.as_str())
                .ok_or_else(|| StoreError::SessionNotFound(id.clone()))?;
            session.state = state;
            Ok(())
        })?;
        self.on_mutated()
    }

    async fn set_session_job_slot(
        &self,
        id: &SessionId,
        stage: StageKey,
        job_id: JobId,
    ) -> Result<(), StoreError> {
        self.write(|s| -> Result<(), StoreError> {
            let session = s
                .sessions
                .get_mut(id.as_str())
                .ok_or_else(|| StoreError::SessionNotFound(id.clone()))?;
            session.jobs.set_slot(stage, job_id);
            Ok(())
        })?;
        self.on_mutated()
    }

    async fn set_session_start_time(&self, id: &SessionId, epoch_ms: u64) -> Result<(), StoreError> {
        self.write(|s| -> Result<(), StoreError> {
            let session = s
                .sessions
                .get_mut(id.as_str())
                .ok_or_else(|| StoreError::SessionNotFound(id.clone()))?;
            session.start_time_ms = Some(epoch_ms);
            Ok(())
        })?;
        self.on_mutated()
    }

    async fn set_session_end_time(&self, id: &SessionId, epoch_ms: u64) -> Result<(), StoreError> {
        self.write(|s| -> Result<(), StoreError> {
            let session = s
                .sessions
                .get_mut(id.as_str())
                .ok_or_else(|| StoreError::SessionNotFound(id.clone()))?;
            session.end_time_ms = Some(epoch_ms);
            Ok(())
        })?;
        self.on_mutated()
    }

    async fn raise_movies_found(&self, id: &SessionId, candidate: u64) -> Result<(), StoreError> {
        self.write(|s| -> Result<(), StoreError> {
            let session = s
                .sessions
                .get_mut(id.as_str())
                .ok_or_else(|| StoreError::SessionNotFound(id.clone()))?;
            session.state.movies_found = session.state.movies_found.max(candidate);
            Ok(())
        })?;
        self.on_mutated()
    }

    async fn push_pass_snapshot(
        &self,
        id: &SessionId,
        snapshot: PassSnapshot,
    ) -> Result<(), StoreError> {
        self.write(|s| -> Result<(), StoreError> {
            let session = s
                .sessions
                .get_mut(id.as_str())
                .ok_or_else(|| StoreError::SessionNotFound(id.clone()))?;
            session.pass_history.push(snapshot);
            Ok(())
        })?;
        self.on_mutated()
    }

    async fn push_activity(&self, id: &SessionId, entry: ActivityEntry) -> Result<(), StoreError> {
        self.write(|s| -> Result<(), StoreError> {
            let session = s
                .sessions
                .get_mut(id.as_str())
                .ok_or_else(|| StoreError::SessionNotFound(id.clone()))?;
            session.push_activity(entry);
            Ok(())
        })?;
        self.on_mutated()
    }

    async fn get_job(&self, id: &JobId) -> Result<Option<Job>, StoreError> {
        Ok(self.read(|s| s.jobs.get(id.as_str()).cloned()))
    }

    async fn insert_job(&self, new_job: NewJob) -> Result<(), StoreError> {
        self.write(|s| -> Result<(), StoreError> {
            if s.jobs.contains_key(new_job.id.as_str()) {
                return Err(StoreError::JobExists(new_job.id.clone()));
            }
            let job = Job::new_with_epoch_ms(
                JobConfig {
                    id: new_job.id.clone(),
                    project_id: new_job.project_id,
                    user_id: new_job.user_id,
                    session_id: new_job.session_id.as_str().to_string(),
                    job_name: new_job.job_name,
                    job_type: new_job.job_type,
                    output_dir: new_job.output_dir,
                    command: new_job.command,
                    parameters: new_job.parameters,
                    input_job_ids: new_job.input_job_ids,
                    execution_mode: new_job.execution_mode,
                },
                new_job.created_at_ms,
            );
            s.jobs.insert(new_job.id.as_str().to_string(), job);
            Ok(())
        })?;
        self.on_mutated()
    }

    async fn mark_job_running(&self, id: &JobId, epoch_ms: u64) -> Result<(), StoreError> {
        self.write(|s| -> Result<(), StoreError> {
            let job = s
                .jobs
                .get_mut(id.as_str())
                .ok_or_else(|| StoreError::JobNotFound(id.clone()))?;
            job.mark_running(epoch_ms);
            Ok(())
        })?;
        self.on_mutated()
    }

    async fn mark_job_success(
        &self,
        id: &JobId,
        epoch_ms: u64,
        stats: PipelineStats,
    ) -> Result<(), StoreError> {
        self.write(|s| -> Result<(), StoreError> {
            let job = s
                .jobs
                .get_mut(id.as_str())
                .ok_or_else(|| StoreError::JobNotFound(id.clone()))?;
            job.mark_success(epoch_ms, stats);
            Ok(())
        })?;
        self.on_mutated()
    }

    async fn mark_job_failed(
        &self,
        id: &JobId,
        epoch_ms: u64,
        error_message: String,
    ) -> Result<(), StoreError> {
        self.write(|s| -> Result<(), StoreError> {
            let job = s
                .jobs
                .get_mut(id.as_str())
                .ok_or_else(|| StoreError::JobNotFound(id.clone()))?;
            job.mark_failed(epoch_ms, error_message);
            Ok(())
        })?;
        self.on_mutated()
    }

    async fn mark_job_cancelled(&self, id: &JobId, epoch_ms: u64) -> Result<(), StoreError> {
        self.write(|s| -> Result<(), StoreError> {
            let job = s
                .jobs
                .get_mut(id.as_str())
                .ok_or_else(|| StoreError::JobNotFound(id.clone()))?;
            job.mark_cancelled(epoch_ms);
            Ok(())
        })?;
        self.on_mutated()
    }

    async fn set_job_cluster_id(
        &self,
        id: &JobId,
        cluster_job_id: String,
    ) -> Result<(), StoreError> {
        self.write(|s| -> Result<(), StoreError> {
            let job = s
                .jobs
                .get_mut(id.as_str())
                .ok_or_else(|| StoreError::JobNotFound(id.clone()))?;
            job.cluster_job_id = Some(cluster_job_id);
            Ok(())
        })?;
        self.on_mutated()
    }

    async fn reset_job_for_rerun(
        &self,
        id: &JobId,
        command: String,
        parameters: HashMap<String, String>,
    ) -> Result<(), StoreError> {
        self.write(|s| -> Result<(), StoreError> {
            let job = s
                .jobs
                .get_mut(id.as_str())
                .ok_or_else(|| StoreError::JobNotFound(id.clone()))?;
            job.status = JobStatus::Pending;
            job.command = command;
            job.parameters = parameters;
            job.start_time_ms = None;
            job.end_time_ms = None;
            job.error_message = None;
            job.cluster_job_id = None;
            Ok(())
        })?;
        self.on_mutated()
    }

    async fn delete_jobs_for_session(&self, session_id: &SessionId) -> Result<(), StoreError> {
        self.write(|s| {
            s.jobs.retain(|_, job| job.session_id != session_id.as_str());
        });
        self.on_mutated()
    }

    async fn list_jobs_for_session(&self, session_id: &SessionId) -> Result<Vec<Job>, StoreError> {
        Ok(self.read(|s| {
            s.jobs
                .values()
                .filter(|j| j.session_id == session_id.as_str())
                .cloned()
                .collect()
        }))
    }

    async fn get_project(&self, id: &ProjectId) -> Result<Option<Project>, StoreError> {
        Ok(self.read(|s| s.projects.get(id.as_str()).cloned()))
    }

    async fn insert_project(&self, project: Project) -> Result<(), StoreError> {
        self.write(|s| -> Result<(), StoreError> {
            if s.projects.contains_key(project.id.as_str()) {
                return Err(StoreError::ProjectExists(project.id.clone()));
            }
            s.projects.insert(project.id.as_str().to_string(), project);
            Ok(())
        })?;
        self.on_mutated()
    }

    async fn allocate_job_name(&self, project_id: &ProjectId) -> Result<String, StoreError> {
        let name = self.write(|s| -> Result<String, StoreError> {
            let project = s
                .projects
                .get_mut(project_id.as_str())
                .ok_or_else(|| StoreError::ProjectNotFound(project_id.clone()))?;
            Ok(project.allocate_job_name())
        })?;
        self.on_mutated()?;
        Ok(name)
    }

    async fn resolve_job_ids_by_name(
        &self,
        project_id: &ProjectId,
        names: &[String],
    ) -> Result<Vec<JobId>, StoreError> {
        Ok(self.read(|s| {
            s.jobs
                .values()
                .filter(|j| {
                    j.project_id.as_str() == project_id.as_str() && names.contains(&j.job_name)
                })
                .map(|j| j.id.clone())
                .collect()
        }))
    }
}
