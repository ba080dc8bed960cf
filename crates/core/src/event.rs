// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events flowing from the Watcher and Cluster Driver into the orchestrator's
//! single event loop.

use crate::job::JobId;
use crate::session::SessionId;
use crate::stage::JobStatus;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Serializes with `{"type": "category:name", ...fields}`, matching the
/// wire shape used by the daemon's activity stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    /// New stable files accumulated past the debounce window.
    #[serde(rename = "watch:files_added")]
    FilesAdded {
        session_id: SessionId,
        files: Vec<PathBuf>,
        /// Cumulative known-file count for the session (MAX-semantics source).
        count: u64,
    },

    /// `existing`-mode scan completed and found nothing.
    #[serde(rename = "watch:no_files")]
    NoFiles {
        session_id: SessionId,
        directory: PathBuf,
    },

    /// A cluster job reached a terminal state.
    #[serde(rename = "cluster:status_changed")]
    JobStatusChanged {
        job_id: JobId,
        status: JobStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        cluster_job_id: Option<String>,
    },

    /// Orchestrator event loop shutdown request.
    #[serde(rename = "system:shutdown")]
    Shutdown,

    /// Catch-all for forward-compatible event types.
    #[serde(other, skip_serializing)]
    Custom,
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::FilesAdded { .. } => "watch:files_added",
            Event::NoFiles { .. } => "watch:no_files",
            Event::JobStatusChanged { .. } => "cluster:status_changed",
            Event::Shutdown => "system:shutdown",
            Event::Custom => "custom",
        }
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            Event::FilesAdded { session_id, .. } | Event::NoFiles { session_id, .. } => {
                Some(session_id)
            }
            _ => None,
        }
    }

    pub fn log_summary(&self) -> String {
        let t = self.name();
        match self {
            Event::FilesAdded {
                session_id, count, ..
            } => format!("{t} session={session_id} count={count}"),
            Event::NoFiles { session_id, .. } => format!("{t} session={session_id}"),
            Event::JobStatusChanged { job_id, status, .. } => {
                format!("{t} job={job_id} status={status}")
            }
            Event::Shutdown | Event::Custom => t.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
