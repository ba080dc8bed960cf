// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{chained_input_path, StageBuilder, ValidationError};
use cryoflow_core::{ExtractionConfig, StageKey};
use std::path::{Path, PathBuf};

pub struct ExtractBuilder {
    pub config: ExtractionConfig,
    pub previous_job_name: String,
    pub input_file: String,
}

impl StageBuilder for ExtractBuilder {
    fn stage(&self) -> StageKey {
        StageKey::Extract
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.config.box_size == 0 {
            return Err(ValidationError::new(StageKey::Extract, "box_size must be non-zero"));
        }
        if self.config.rescale && self.config.rescaled_size == 0 {
            return Err(ValidationError::new(
                StageKey::Extract,
                "rescaled_size must be non-zero when rescale is enabled",
            ));
        }
        if self.config.rescale && self.config.rescaled_size > self.config.box_size {
            return Err(ValidationError::new(
                StageKey::Extract,
                "rescaled_size cannot exceed box_size",
            ));
        }
        Ok(())
    }

    fn get_input_job_names(&self) -> Vec<String> {
        vec![self.previous_job_name.clone()]
    }

    fn build_command(&self, output_dir: &Path, job_name: &str) -> Vec<String> {
        let input_path = chained_input_path(StageKey::Pick, &self.previous_job_name, &self.input_file);
        let mut argv = vec![
            "relion_preprocess".to_string(),
            "--i".to_string(),
            input_path.display().to_string(),
            "--o".to_string(),
            output_dir.join(job_name).display().to_string(),
            "--extract".to_string(),
            "--extract_size".to_string(),
            self.config.box_size.to_string(),
        ];
        if self.config.rescale {
            argv.push("--rescale".to_string());
            argv.push(self.config.rescaled_size.to_string());
        }
        if self.config.normalize {
            argv.push("--norm".to_string());
        }
        if self.config.invert_contrast {
            argv.push("--invert_contrast".to_string());
        }
        argv
    }
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod tests;
