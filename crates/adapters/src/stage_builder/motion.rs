// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{chained_input_path, StageBuilder, ValidationError};
use cryoflow_core::{MotionConfig, StageKey};
use std::path::{Path, PathBuf};

/// Motion correction. GPU mode switches between two downstream implementations.
pub struct MotionBuilder {
    pub config: MotionConfig,
    pub previous_job_name: String,
    pub input_file: String,
}

impl StageBuilder for MotionBuilder {
    fn stage(&self) -> StageKey {
        StageKey::Motion
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.config.patch_x == 0 || self.config.patch_y == 0 {
            return Err(ValidationError::new(
                StageKey::Motion,
                "patch grid dimensions must be non-zero",
            ));
        }
        if self.config.bin_factor <= 0.0 {
            return Err(ValidationError::new(
                StageKey::Motion,
                "bin factor must be positive",
            ));
        }
        Ok(())
    }

    fn get_input_job_names(&self) -> Vec<String> {
        vec![self.previous_job_name.clone()]
    }

    fn build_command(&self, output_dir: &Path, job_name: &str) -> Vec<String> {
        let input_path = chained_input_path(StageKey::Import, &self.previous_job_name, &self.input_file);
        let binary = if self.config.gpu {
            "motioncor2"
        } else {
            "unblur"
        };
        vec![
            binary.to_string(),
            "--i".to_string(),
            input_path.display().to_string(),
            "--o".to_string(),
            output_dir.join(job_name).display().to_string(),
            "--patch".to_string(),
            format!("{} {}", self.config.patch_x, self.config.patch_y),
            "--dose_per_frame".to_string(),
            self.config.dose_per_frame.to_string(),
            "--bin_factor".to_string(),
            self.config.bin_factor.to_string(),
        ]
    }

    fn supports_gpu(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "motion_tests.rs"]
mod tests;
