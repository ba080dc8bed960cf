// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-stage command builders: one [`StageBuilder`] implementation per
//! [`StageKey`], each knowing how to validate its own parameters and produce
//! an argv for its external tool. Reasonably faithful reference builders,
//! not an encyclopedia of every flag a real tool accepts.

mod class2d;
mod ctf;
mod extract;
mod import;
mod motion;
mod pick;

pub use class2d::Class2dBuilder;
pub use ctf::CtfBuilder;
pub use extract::ExtractBuilder;
pub use import::ImportBuilder;
pub use motion::MotionBuilder;
pub use pick::PickBuilder;

use cryoflow_core::StageKey;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{stage}: {message}")]
    InvalidParameters { stage: StageKey, message: String },
}

impl ValidationError {
    fn new(stage: StageKey, message: impl Into<String>) -> Self {
        Self::InvalidParameters {
            stage,
            message: message.into(),
        }
    }
}

pub trait StageBuilder: Send + Sync {
    fn stage(&self) -> StageKey;

    fn validate(&self) -> Result<(), ValidationError>;

    /// Output directory for a job of this stage, relative to the project root.
    fn get_output_dir(&self, job_name: &str) -> PathBuf {
        PathBuf::from(self.stage().as_str()).join(job_name)
    }

    /// Job names this stage's command reads inputs from, in the order the
    /// orchestrator should resolve them to job ids for `NewJob::input_job_ids`.
    fn get_input_job_names(&self) -> Vec<String>;

    /// Full argv for this stage, including the binary name as element 0.
    fn build_command(&self, output_dir: &Path, job_name: &str) -> Vec<String>;

    fn supports_gpu(&self) -> bool {
        false
    }

    fn supports_mpi(&self) -> bool {
        true
    }

    /// Optional post-run shell snippet, passed opaquely to the cluster driver.
    fn post_command(&self) -> Option<String> {
        None
    }
}

/// Forms the relative input path for chaining one stage's output into the
/// next: `<StageKind>/<previous_job_name>/<file>`.
pub fn chained_input_path(previous_stage: StageKey, previous_job_name: &str, file: &str) -> PathBuf {
    PathBuf::from(previous_stage.as_str())
        .join(previous_job_name)
        .join(file)
}
