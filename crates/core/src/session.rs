// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session aggregate: the central entity driving one live pipeline run.

use crate::activity::ActivityEntry;
use crate::config::{
    Class2dConfig, CtfConfig, ExtractionConfig, MotionConfig, OpticsConfig, PickingConfig,
    SlurmConfig, ThresholdsConfig,
};
use crate::job::JobId;
use crate::owner::{ProjectId, UserId};
use crate::stage::StageKey;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

crate::define_id! {
    /// Unique identifier for a pipeline session.
    pub struct SessionId;
}

/// How the watch directory is treated: an indefinite watch, or a bounded
/// one-shot scan of a directory that already holds its files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    Watch,
    Existing,
}

/// Externally observable lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Running,
    Paused,
    Stopped,
    Completed,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Stopped | SessionStatus::Completed)
    }
}

/// Per-stage job id slots. Each main-line stage gets at most one job for the
/// lifetime of the session (re-runs reuse the slot); Class2D fires repeatedly
/// into an ordered, append-only list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobSlots {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import_id: Option<JobId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion_id: Option<JobId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ctf_id: Option<JobId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pick_id: Option<JobId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_id: Option<JobId>,
    #[serde(default)]
    pub class2d_ids: Vec<JobId>,
}

impl JobSlots {
    pub fn slot_for(&self, stage: StageKey) -> Option<&JobId> {
        match stage {
            StageKey::Import => self.import_id.as_ref(),
            StageKey::Motion => self.motion_id.as_ref(),
            StageKey::Ctf => self.ctf_id.as_ref(),
            StageKey::Pick => self.pick_id.as_ref(),
            StageKey::Extract => self.extract_id.as_ref(),
            StageKey::Class2d => self.class2d_ids.last(),
        }
    }

    pub fn set_slot(&mut self, stage: StageKey, id: JobId) {
        match stage {
            StageKey::Import => self.import_id = Some(id),
            StageKey::Motion => self.motion_id = Some(id),
            StageKey::Ctf => self.ctf_id = Some(id),
            StageKey::Pick => self.pick_id = Some(id),
            StageKey::Extract => self.extract_id = Some(id),
            StageKey::Class2d => self.class2d_ids.push(id),
        }
    }
}

/// Mutable pipeline-progress counters, reset/advanced once per pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_stage: Option<StageKey>,
    pub pass_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_pipeline_pass_ms: Option<u64>,
    pub movies_found: u64,
    pub movies_imported: u64,
    pub movies_motion: u64,
    pub movies_ctf: u64,
    pub movies_picked: u64,
    pub particles_extracted: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_from: Option<StageKey>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_batch_2d_ms: Option<u64>,
    pub movies_at_pass_start: u64,
}

/// Snapshot of counters at the end of one pipeline pass, retained for the
/// append-only `pass_history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassSnapshot {
    pub pass_number: u64,
    pub finished_at_ms: u64,
    pub movies_found: u64,
    pub movies_imported: u64,
    pub movies_motion: u64,
    pub movies_ctf: u64,
    pub movies_picked: u64,
    pub particles_extracted: u64,
    pub triggered_rerun: bool,
}

/// Immutable per-stage configuration chosen at session creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub optics: OpticsConfig,
    pub motion_config: MotionConfig,
    pub ctf_config: CtfConfig,
    pub picking_config: PickingConfig,
    pub extraction_config: ExtractionConfig,
    pub class2d_config: Class2dConfig,
    pub thresholds: ThresholdsConfig,
    pub slurm_config: SlurmConfig,
}

/// The central entity: one live (or finished) pipeline run over a watched
/// directory of movies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub session_name: String,
    pub input_mode: InputMode,
    pub watch_directory: PathBuf,
    pub file_pattern: String,
    pub config: SessionConfig,
    pub status: SessionStatus,
    pub state: SessionState,
    pub jobs: JobSlots,
    #[serde(default)]
    pub pass_history: Vec<PassSnapshot>,
    #[serde(default)]
    pub activity_log: Vec<ActivityEntry>,
    pub created_at_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time_ms: Option<u64>,
}

impl Session {
    pub fn new(
        id: SessionId,
        project_id: ProjectId,
        user_id: UserId,
        session_name: impl Into<String>,
        input_mode: InputMode,
        watch_directory: PathBuf,
        file_pattern: impl Into<String>,
        config: SessionConfig,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id,
            project_id,
            user_id,
            session_name: session_name.into(),
            input_mode,
            watch_directory,
            file_pattern: file_pattern.into(),
            config,
            status: SessionStatus::Pending,
            state: SessionState::default(),
            jobs: JobSlots::default(),
            pass_history: Vec::new(),
            activity_log: Vec::new(),
            created_at_ms,
            start_time_ms: None,
            end_time_ms: None,
        }
    }

    pub fn push_activity(&mut self, entry: ActivityEntry) {
        self.activity_log.push(entry);
    }

    /// Checks the data-model invariant that found/imported/motion/ctf/picked
    /// counts never decrease downstream of an upstream count.
    pub fn counters_monotonic(&self) -> bool {
        let s = &self.state;
        s.movies_found >= s.movies_imported
            && s.movies_imported >= s.movies_motion
            && s.movies_motion >= s.movies_ctf
            && s.movies_ctf >= s.movies_picked
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
