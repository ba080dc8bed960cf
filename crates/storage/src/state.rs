// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state rebuilt from WAL replay.

use cryoflow_core::{Event, Job, JobStatus, Project, Session, SessionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// In-memory projection of all sessions, jobs, and projects.
///
/// Only the fields actually carried on [`Event`] are updated by
/// [`apply_event`](MaterializedState::apply_event); the bulk of session/job
/// mutation happens through direct `SessionStore` calls, which durable
/// stores additionally log as events for replay.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    pub sessions: HashMap<String, Session>,
    pub jobs: HashMap<String, Job>,
    pub projects: HashMap<String, Project>,
}

impl MaterializedState {
    pub fn find_session_by_job_id(&self, job_id: &str) -> Option<&Session> {
        self.sessions.values().find(|s| {
            s.jobs.import_id.as_ref().map(|j| j.as_str()) == Some(job_id)
                || s.jobs.motion_id.as_ref().map(|j| j.as_str()) == Some(job_id)
                || s.jobs.ctf_id.as_ref().map(|j| j.as_str()) == Some(job_id)
                || s.jobs.pick_id.as_ref().map(|j| j.as_str()) == Some(job_id)
                || s.jobs.extract_id.as_ref().map(|j| j.as_str()) == Some(job_id)
                || s.jobs.class2d_ids.iter().any(|j| j.as_str() == job_id)
        })
    }

    /// Apply an event's idempotent, WAL-replayable side effects.
    ///
    /// Events carry only the facts needed for crash-safe recovery of
    /// transient counters and terminal job status; richer mutations (activity
    /// log, pass history, session status) are applied directly by the
    /// orchestrator through `SessionStore` and persisted via the durable
    /// store's own event log before this function is reached.
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::FilesAdded {
                session_id, count, ..
            } => {
                if let Some(session) = self.sessions.get_mut(session_id.as_str()) {
                    session.state.movies_found = session.state.movies_found.max(*count);
                }
            }
            Event::JobStatusChanged {
                job_id,
                status,
                cluster_job_id,
            } => {
                if let Some(job) = self.jobs.get_mut(job_id.as_str()) {
                    // Idempotency: never let a stale duplicate regress a terminal status.
                    if !job.status.is_terminal() || *status == JobStatus::Cancelled {
                        job.status = *status;
                    }
                    if let Some(cid) = cluster_job_id {
                        job.cluster_job_id = Some(cid.clone());
                    }
                }
            }
            Event::NoFiles { .. } | Event::Shutdown | Event::Custom => {}
        }
    }

    pub fn session_by_id(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id.as_str())
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
