// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster driver adapters: submit/cancel/inspect cluster jobs.

mod slurm;

pub use slurm::SlurmClusterDriver;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeClusterDriver, SubmitCall};

use async_trait::async_trait;
use cryoflow_core::{JobId, JobStatus};
use std::path::Path;
use thiserror::Error;
use tokio::sync::broadcast;

/// Errors from cluster driver operations.
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error("submission failed: {0}")]
    SubmitFailed(String),
    #[error("job details unavailable for {0}")]
    DetailsUnavailable(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resource parameters derived from session config for one stage submission.
#[derive(Debug, Clone)]
pub struct ClusterParams {
    pub partition: Option<String>,
    pub mpi: u32,
    pub threads: u32,
    pub gpu_count: u32,
}

/// Result of a successful submission.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub cluster_job_id: String,
}

/// Job state as reported by the scheduler, used only for error enrichment.
#[derive(Debug, Clone)]
pub struct JobDetails {
    pub state: String,
    pub exit_code: Option<i32>,
    pub elapsed_secs: Option<u64>,
}

/// One `status-change` delivery from the driver's event stream. Only
/// terminal transitions (`success`/`failed`) are ever sent, and at-least-once.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub job_id: JobId,
    pub cluster_job_id: String,
    pub status: JobStatus,
}

#[async_trait]
pub trait ClusterDriver: Send + Sync + 'static {
    /// Submit a stage command, correlated to the orchestrator's own `job_id`
    /// so later `status-change` events can be mapped back to it.
    /// `project_path` is the project root (which the downstream tool resolves
    /// relative input paths against via the session symlink); `output_dir` is
    /// created by the orchestrator before this call.
    async fn submit(
        &self,
        job_id: &JobId,
        command: &str,
        job_name: &str,
        project_path: &Path,
        output_dir: &Path,
        params: &ClusterParams,
    ) -> Result<SubmitOutcome, ClusterError>;

    /// Best-effort cancellation; the driver may no-op if the job already finished.
    async fn cancel(&self, cluster_job_id: &str) -> Result<(), ClusterError>;

    /// Used only for error enrichment after a job has already terminated.
    async fn get_job_details(&self, cluster_job_id: &str) -> Result<JobDetails, ClusterError>;

    /// Subscribe to this driver's terminal-transition stream. Each call
    /// returns an independent receiver fed by the same underlying poll loop.
    fn subscribe(&self) -> broadcast::Receiver<StatusChange>;
}
