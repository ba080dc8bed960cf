// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{chained_input_path, StageBuilder, ValidationError};
use cryoflow_core::{CtfConfig, StageKey};
use std::path::{Path, PathBuf};

pub struct CtfBuilder {
    pub config: CtfConfig,
    pub previous_job_name: String,
    pub input_file: String,
}

impl StageBuilder for CtfBuilder {
    fn stage(&self) -> StageKey {
        StageKey::Ctf
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.config.defocus_min >= self.config.defocus_max {
            return Err(ValidationError::new(
                StageKey::Ctf,
                "defocus_min must be less than defocus_max",
            ));
        }
        if self.config.defocus_step <= 0.0 {
            return Err(ValidationError::new(
                StageKey::Ctf,
                "defocus_step must be positive",
            ));
        }
        Ok(())
    }

    fn get_input_job_names(&self) -> Vec<String> {
        vec![self.previous_job_name.clone()]
    }

    fn build_command(&self, output_dir: &Path, job_name: &str) -> Vec<String> {
        let input_path = chained_input_path(StageKey::Motion, &self.previous_job_name, &self.input_file);
        vec![
            "ctffind".to_string(),
            "--i".to_string(),
            input_path.display().to_string(),
            "--o".to_string(),
            output_dir.join(job_name).display().to_string(),
            "--defocus_min".to_string(),
            self.config.defocus_min.to_string(),
            "--defocus_max".to_string(),
            self.config.defocus_max.to_string(),
            "--defocus_step".to_string(),
            self.config.defocus_step.to_string(),
        ]
    }
}

#[cfg(test)]
#[path = "ctf_tests.rs"]
mod tests;
