// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{chained_input_path, StageBuilder, ValidationError};
use cryoflow_core::{Class2dConfig, Class2dVariant, StageKey};
use std::path::{Path, PathBuf};

/// 2D classification side branch. Fires repeatedly into fresh output
/// directories and is never re-run into an existing one.
pub struct Class2dBuilder {
    pub config: Class2dConfig,
    pub previous_job_name: String,
    pub input_file: String,
}

impl StageBuilder for Class2dBuilder {
    fn stage(&self) -> StageKey {
        StageKey::Class2d
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.config.class_count == 0 {
            return Err(ValidationError::new(
                StageKey::Class2d,
                "class_count must be non-zero",
            ));
        }
        Ok(())
    }

    fn get_input_job_names(&self) -> Vec<String> {
        vec![self.previous_job_name.clone()]
    }

    fn build_command(&self, output_dir: &Path, job_name: &str) -> Vec<String> {
        let input_path = chained_input_path(StageKey::Extract, &self.previous_job_name, &self.input_file);
        vec![
            "relion_refine".to_string(),
            "--i".to_string(),
            input_path.display().to_string(),
            "--o".to_string(),
            output_dir.join(job_name).display().to_string(),
            "--2d".to_string(),
            "--K".to_string(),
            self.config.class_count.to_string(),
            "--iter".to_string(),
            self.config.default_iterations().to_string(),
        ]
    }

    fn supports_gpu(&self) -> bool {
        true
    }

    fn supports_mpi(&self) -> bool {
        !matches!(self.config.variant, Class2dVariant::Fast)
    }
}

#[cfg(test)]
#[path = "class2d_tests.rs"]
mod tests;
