// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{StageBuilder, ValidationError};
use cryoflow_core::{OpticsConfig, StageKey};
use std::path::{Path, PathBuf};

/// First stage of the pipeline: registers a batch of raw movies with the
/// downstream tool. Has no input chaining and no per-stage config beyond the
/// session's optics block and the files the watcher reported.
pub struct ImportBuilder {
    pub files: Vec<PathBuf>,
    pub optics: OpticsConfig,
}

impl StageBuilder for ImportBuilder {
    fn stage(&self) -> StageKey {
        StageKey::Import
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.files.is_empty() {
            return Err(ValidationError::new(
                StageKey::Import,
                "no files to import",
            ));
        }
        Ok(())
    }

    fn get_input_job_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn build_command(&self, output_dir: &Path, job_name: &str) -> Vec<String> {
        let mut argv = vec![
            "relion_import".to_string(),
            "--o".to_string(),
            output_dir.join(job_name).display().to_string(),
            "--angpix".to_string(),
            self.optics.pixel_size_angstrom.to_string(),
            "--kV".to_string(),
            self.optics.voltage_kv.to_string(),
            "--Cs".to_string(),
            self.optics.spherical_aberration_mm.to_string(),
            "--Q0".to_string(),
            self.optics.amplitude_contrast.to_string(),
        ];
        for file in &self.files {
            argv.push(file.display().to_string());
        }
        argv
    }
}

#[cfg(test)]
#[path = "import_tests.rs"]
mod tests;
