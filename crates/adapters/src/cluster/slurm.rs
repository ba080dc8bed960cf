// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slurm-backed cluster driver: shells out to `sbatch`/`scancel`/`sacct` and
//! polls submitted jobs on an interval to synthesize `status-change` events.

use super::{ClusterDriver, ClusterError, ClusterParams, JobDetails, StatusChange, SubmitOutcome};
use crate::subprocess::{run_with_timeout, JOB_DETAILS_TIMEOUT, SUBMIT_TIMEOUT};
use async_trait::async_trait;
use cryoflow_core::{JobId, JobStatus};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;
use tokio::sync::broadcast;
use tracing::{info, warn};

const POLL_INTERVAL: Duration = Duration::from_secs(10);
const CHANNEL_CAPACITY: usize = 256;

/// Slurm states this driver treats as terminal-success / terminal-failure.
/// Anything else (`PENDING`, `RUNNING`, `CONFIGURING`, ...) is still in flight.
fn classify(slurm_state: &str) -> Option<JobStatus> {
    match slurm_state {
        "COMPLETED" => Some(JobStatus::Success),
        "FAILED" | "TIMEOUT" | "OUT_OF_MEMORY" | "NODE_FAIL" => Some(JobStatus::Failed),
        "CANCELLED" => Some(JobStatus::Cancelled),
        _ => None,
    }
}

struct Tracked {
    job_id: JobId,
}

pub struct SlurmClusterDriver {
    tx: broadcast::Sender<StatusChange>,
    tracked: Arc<Mutex<HashMap<String, Tracked>>>,
}

impl SlurmClusterDriver {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        let tracked = Arc::new(Mutex::new(HashMap::new()));
        spawn_poll_loop(tx.clone(), tracked.clone());
        Self { tx, tracked }
    }
}

impl Default for SlurmClusterDriver {
    fn default() -> Self {
        Self::new()
    }
}

fn spawn_poll_loop(tx: broadcast::Sender<StatusChange>, tracked: Arc<Mutex<HashMap<String, Tracked>>>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        loop {
            interval.tick().await;
            let cluster_job_ids: Vec<String> = tracked.lock().keys().cloned().collect();
            for cluster_job_id in cluster_job_ids {
                match sacct_state(&cluster_job_id).await {
                    Ok(Some(slurm_state)) => {
                        if let Some(status) = classify(&slurm_state) {
                            let job_id = {
                                let mut guard = tracked.lock();
                                guard.remove(&cluster_job_id).map(|t| t.job_id)
                            };
                            if let Some(job_id) = job_id {
                                info!(%cluster_job_id, %slurm_state, "slurm job reached terminal state");
                                let _ = tx.send(StatusChange {
                                    job_id,
                                    cluster_job_id,
                                    status,
                                });
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!(%cluster_job_id, error = %e, "sacct poll failed"),
                }
            }
        }
    });
}

async fn sacct_state(cluster_job_id: &str) -> Result<Option<String>, ClusterError> {
    let mut cmd = Command::new("sacct");
    cmd.args(["-j", cluster_job_id, "-n", "-o", "State", "-P"]);
    let output = run_with_timeout(cmd, JOB_DETAILS_TIMEOUT, "sacct")
        .await
        .map_err(ClusterError::SubmitFailed)?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout
        .lines()
        .next()
        .map(|line| line.trim().to_string())
        .filter(|s| !s.is_empty()))
}

#[async_trait]
impl ClusterDriver for SlurmClusterDriver {
    async fn submit(
        &self,
        job_id: &JobId,
        command: &str,
        job_name: &str,
        project_path: &Path,
        output_dir: &Path,
        params: &ClusterParams,
    ) -> Result<SubmitOutcome, ClusterError> {
        std::fs::create_dir_all(output_dir)?;

        let mut cmd = Command::new("sbatch");
        cmd.current_dir(project_path);
        cmd.arg(format!("--job-name={job_name}"));
        cmd.arg(format!(
            "--output={}",
            output_dir.join("slurm-%j.out").display()
        ));
        if let Some(partition) = &params.partition {
            cmd.arg(format!("--partition={partition}"));
        }
        if params.mpi > 1 {
            cmd.arg(format!("--ntasks={}", params.mpi));
        }
        cmd.arg(format!("--cpus-per-task={}", params.threads));
        if params.gpu_count > 0 {
            cmd.arg(format!("--gres=gpu:{}", params.gpu_count));
        }
        cmd.arg("--wrap").arg(command);

        let output = run_with_timeout(cmd, SUBMIT_TIMEOUT, "sbatch")
            .await
            .map_err(ClusterError::SubmitFailed)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(ClusterError::SubmitFailed(stderr));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let cluster_job_id = stdout
            .split_whitespace()
            .last()
            .ok_or_else(|| ClusterError::SubmitFailed("sbatch produced no job id".to_string()))?
            .to_string();

        self.tracked.lock().insert(
            cluster_job_id.clone(),
            Tracked {
                job_id: job_id.clone(),
            },
        );

        Ok(SubmitOutcome { cluster_job_id })
    }

    async fn cancel(&self, cluster_job_id: &str) -> Result<(), ClusterError> {
        self.tracked.lock().remove(cluster_job_id);
        let mut cmd = Command::new("scancel");
        cmd.arg(cluster_job_id);
        // Best-effort: a failure here (job already gone) is not surfaced.
        let _ = run_with_timeout(cmd, SUBMIT_TIMEOUT, "scancel").await;
        Ok(())
    }

    async fn get_job_details(&self, cluster_job_id: &str) -> Result<JobDetails, ClusterError> {
        let mut cmd = Command::new("sacct");
        cmd.args([
            "-j",
            cluster_job_id,
            "-n",
            "-o",
            "State,ExitCode,Elapsed",
            "-P",
        ]);
        let output = run_with_timeout(cmd, JOB_DETAILS_TIMEOUT, "sacct")
            .await
            .map_err(ClusterError::SubmitFailed)?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout
            .lines()
            .next()
            .ok_or_else(|| ClusterError::DetailsUnavailable(cluster_job_id.to_string()))?;
        let mut fields = line.split('|');
        let state = fields.next().unwrap_or_default().trim().to_string();
        let exit_code = fields
            .next()
            .and_then(|s| s.split(':').next())
            .and_then(|s| s.parse::<i32>().ok());
        let elapsed_secs = fields.next().and_then(parse_slurm_elapsed);

        Ok(JobDetails {
            state,
            exit_code,
            elapsed_secs,
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<StatusChange> {
        self.tx.subscribe()
    }
}

/// Parses Slurm's `[DD-]HH:MM:SS` elapsed-time format into total seconds.
fn parse_slurm_elapsed(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let (days, rest) = match raw.split_once('-') {
        Some((d, rest)) => (d.parse::<u64>().ok()?, rest),
        None => (0, raw),
    };
    let parts: Vec<&str> = rest.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (h.parse::<u64>().ok()?, m.parse::<u64>().ok()?, s.parse::<u64>().ok()?),
        [m, s] => (0, m.parse::<u64>().ok()?, s.parse::<u64>().ok()?),
        _ => return None,
    };
    Some(days * 86_400 + hours * 3_600 + minutes * 60 + seconds)
}

#[cfg(test)]
#[path = "slurm_tests.rs"]
mod tests;
