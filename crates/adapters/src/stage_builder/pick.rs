// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{chained_input_path, StageBuilder, ValidationError};
use cryoflow_core::{PickingConfig, PickingMethod, StageKey};
use std::path::{Path, PathBuf};

pub struct PickBuilder {
    pub config: PickingConfig,
    pub previous_job_name: String,
    pub input_file: String,
}

impl StageBuilder for PickBuilder {
    fn stage(&self) -> StageKey {
        StageKey::Pick
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.config.diameter_min_angstrom >= self.config.diameter_max_angstrom {
            return Err(ValidationError::new(
                StageKey::Pick,
                "diameter_min must be less than diameter_max",
            ));
        }
        Ok(())
    }

    fn get_input_job_names(&self) -> Vec<String> {
        vec![self.previous_job_name.clone()]
    }

    fn build_command(&self, output_dir: &Path, job_name: &str) -> Vec<String> {
        let input_path = chained_input_path(StageKey::Ctf, &self.previous_job_name, &self.input_file);
        let mut argv = vec![
            "relion_autopick".to_string(),
            "--i".to_string(),
            input_path.display().to_string(),
            "--o".to_string(),
            output_dir.join(job_name).display().to_string(),
        ];
        match self.config.method {
            PickingMethod::Log => {
                argv.push("--LoG".to_string());
                argv.push("--LoG_diam_min".to_string());
                argv.push(self.config.diameter_min_angstrom.to_string());
                argv.push("--LoG_diam_max".to_string());
                argv.push(self.config.diameter_max_angstrom.to_string());
            }
            PickingMethod::Template => {
                argv.push("--ref".to_string());
                argv.push("--threshold".to_string());
                argv.push(self.config.threshold.to_string());
            }
        }
        argv
    }

    fn supports_gpu(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "pick_tests.rs"]
mod tests;
