// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory [`ClusterDriver`] double for tests: records submissions and lets
//! the test drive terminal transitions by hand instead of waiting on a real
//! scheduler.

use super::{ClusterDriver, ClusterError, ClusterParams, JobDetails, StatusChange, SubmitOutcome};
use async_trait::async_trait;
use cryoflow_core::{JobId, JobStatus};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

/// One recorded call to [`FakeClusterDriver::submit`].
#[derive(Debug, Clone)]
pub struct SubmitCall {
    pub job_id: JobId,
    pub command: String,
    pub job_name: String,
    pub project_path: PathBuf,
    pub output_dir: PathBuf,
    pub params: ClusterParams,
}

pub struct FakeClusterDriver {
    tx: broadcast::Sender<StatusChange>,
    calls: Mutex<Vec<SubmitCall>>,
    next_id: AtomicU64,
    /// When set, every `submit` call fails with this message instead of succeeding.
    fail_submit: Mutex<Option<String>>,
}

impl FakeClusterDriver {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(64);
        Self {
            tx,
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            fail_submit: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> Vec<SubmitCall> {
        self.calls.lock().clone()
    }

    pub fn set_fail_submit(&self, message: impl Into<String>) {
        *self.fail_submit.lock() = Some(message.into());
    }

    /// Directly push a terminal transition to all current subscribers, as if
    /// the scheduler had reported it.
    pub fn emit(&self, job_id: JobId, cluster_job_id: impl Into<String>, status: JobStatus) {
        let _ = self.tx.send(StatusChange {
            job_id,
            cluster_job_id: cluster_job_id.into(),
            status,
        });
    }
}

impl Default for FakeClusterDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClusterDriver for FakeClusterDriver {
    async fn submit(
        &self,
        job_id: &JobId,
        command: &str,
        job_name: &str,
        project_path: &Path,
        output_dir: &Path,
        params: &ClusterParams,
    ) -> Result<SubmitOutcome, ClusterError> {
        if let Some(message) = self.fail_submit.lock().clone() {
            return Err(ClusterError::SubmitFailed(message));
        }

        self.calls.lock().push(SubmitCall {
            job_id: job_id.clone(),
            command: command.to_string(),
            job_name: job_name.to_string(),
            project_path: project_path.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            params: params.clone(),
        });

        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(SubmitOutcome {
            cluster_job_id: format!("fake-{n}"),
        })
    }

    async fn cancel(&self, _cluster_job_id: &str) -> Result<(), ClusterError> {
        Ok(())
    }

    async fn get_job_details(&self, _cluster_job_id: &str) -> Result<JobDetails, ClusterError> {
        Ok(JobDetails {
            state: "COMPLETED".to_string(),
            exit_code: Some(0),
            elapsed_secs: Some(0),
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<StatusChange> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
