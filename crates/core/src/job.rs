// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cluster job records: one per submitted stage execution.

use crate::clock::Clock;
use crate::owner::{ProjectId, UserId};
use crate::stage::{JobStatus, StageKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

crate::define_id! {
    /// Unique identifier for a submitted cluster job.
    #[derive(Default)]
    pub struct JobId;
}

/// How a job was dispatched to the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    Slurm,
    Local,
}

/// Summary statistics a stage reports once it finishes, used both to drive
/// progress counters and to populate session-level activity entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineStats {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_size_angstrom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub micrograph_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particle_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution_angstrom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iteration_count: Option<u32>,
}

/// Configuration for creating a new job record.
#[derive(Debug, Clone)]
pub struct JobConfig {
    pub id: JobId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub session_id: String,
    pub job_name: String,
    pub job_type: StageKey,
    pub output_dir: PathBuf,
    pub command: String,
    pub parameters: HashMap<String, String>,
    pub input_job_ids: Vec<JobId>,
    pub execution_mode: ExecutionMode,
}

/// A single submitted stage execution.
///
/// A job normally transitions `pending -> running -> {success,failed,
/// cancelled}` once. A count-mismatch or a resumed failure resets the same
/// record back to `pending` with a fresh command rather than allocating a
/// new job id, so a session's per-stage job slot always names the job
/// currently responsible for that stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub session_id: String,
    pub job_name: String,
    pub job_type: StageKey,
    pub status: JobStatus,
    pub output_dir: PathBuf,
    pub command: String,
    pub parameters: HashMap<String, String>,
    pub input_job_ids: Vec<JobId>,
    pub execution_mode: ExecutionMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_job_id: Option<String>,
    pub created_at_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub pipeline_stats: PipelineStats,
}

impl Job {
    pub fn new(config: JobConfig, clock: &impl Clock) -> Self {
        Self::new_with_epoch_ms(config, clock.epoch_ms())
    }

    /// Build a job with an explicit creation timestamp, used during WAL replay
    /// where the original clock reading must be preserved rather than re-stamped.
    pub fn new_with_epoch_ms(config: JobConfig, epoch_ms: u64) -> Self {
        Self {
            id: config.id,
            project_id: config.project_id,
            user_id: config.user_id,
            session_id: config.session_id,
            job_name: config.job_name,
            job_type: config.job_type,
            status: JobStatus::Pending,
            output_dir: config.output_dir,
            command: config.command,
            parameters: config.parameters,
            input_job_ids: config.input_job_ids,
            execution_mode: config.execution_mode,
            cluster_job_id: None,
            created_at_ms: epoch_ms,
            start_time_ms: None,
            end_time_ms: None,
            error_message: None,
            pipeline_stats: PipelineStats::default(),
        }
    }

    pub fn with_cluster_job_id(mut self, cluster_job_id: impl Into<String>) -> Self {
        self.cluster_job_id = Some(cluster_job_id.into());
        self
    }

    /// Mark the job running, recording the start timestamp.
    pub fn mark_running(&mut self, epoch_ms: u64) {
        self.status = JobStatus::Running;
        self.start_time_ms = Some(epoch_ms);
    }

    pub fn mark_success(&mut self, epoch_ms: u64, stats: PipelineStats) {
        self.status = JobStatus::Success;
        self.end_time_ms = Some(epoch_ms);
        self.pipeline_stats = stats;
    }

    pub fn mark_failed(&mut self, epoch_ms: u64, error_message: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.end_time_ms = Some(epoch_ms);
        self.error_message = Some(error_message.into());
    }

    pub fn mark_cancelled(&mut self, epoch_ms: u64) {
        self.status = JobStatus::Cancelled;
        self.end_time_ms = Some(epoch_ms);
    }

    pub fn duration_ms(&self) -> Option<u64> {
        let start = self.start_time_ms?;
        let end = self.end_time_ms?;
        Some(end.saturating_sub(start))
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
