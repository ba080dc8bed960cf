// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-stage configuration sub-records attached to a session.
//!
//! Every stage config carries an `enabled` flag. Import has no config
//! struct of its own: it is always enabled and has no tunables beyond the
//! watch directory and file pattern already on the session.

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Optics parameters shared by the whole session (pixel size, voltage, Cs).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpticsConfig {
    pub pixel_size_angstrom: f64,
    pub voltage_kv: f64,
    pub spherical_aberration_mm: f64,
    pub amplitude_contrast: f64,
}

impl Default for OpticsConfig {
    fn default() -> Self {
        Self {
            pixel_size_angstrom: 1.0,
            voltage_kv: 300.0,
            spherical_aberration_mm: 2.7,
            amplitude_contrast: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub gpu: bool,
    pub patch_x: u32,
    pub patch_y: u32,
    pub dose_per_frame: f64,
    pub bin_factor: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            gpu: true,
            patch_x: 5,
            patch_y: 5,
            dose_per_frame: 1.0,
            bin_factor: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CtfConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub defocus_min: f64,
    pub defocus_max: f64,
    pub defocus_step: f64,
}

impl Default for CtfConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            defocus_min: 5000.0,
            defocus_max: 50000.0,
            defocus_step: 500.0,
        }
    }
}

/// Particle-picking method: LoG or template, mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickingMethod {
    Log,
    Template,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub method: PickingMethod,
    pub diameter_min_angstrom: f64,
    pub diameter_max_angstrom: f64,
    pub threshold: f64,
}

impl Default for PickingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            method: PickingMethod::Log,
            diameter_min_angstrom: 100.0,
            diameter_max_angstrom: 200.0,
            threshold: 0.3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub box_size: u32,
    pub rescale: bool,
    pub rescaled_size: u32,
    pub normalize: bool,
    pub invert_contrast: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            box_size: 256,
            rescale: false,
            rescaled_size: 128,
            normalize: true,
            invert_contrast: true,
        }
    }
}

/// Variant selected for 2D classification. The fast variant forces MPI to 1
/// and defaults to a higher iteration count.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Class2dVariant {
    Fast,
    Slow,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Class2dConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub variant: Class2dVariant,
    pub class_count: u32,
    /// Trigger predicate threshold: fire once this many particles exist.
    pub particle_threshold: u64,
    /// Minimum milliseconds between successive firings.
    pub batch_interval_ms: u64,
}

impl Class2dConfig {
    /// Default iteration count for the configured variant.
    pub fn default_iterations(self) -> u32 {
        match self.variant {
            Class2dVariant::Fast => 25,
            Class2dVariant::Slow => 10,
        }
    }
}

impl Default for Class2dConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            variant: Class2dVariant::Fast,
            class_count: 50,
            particle_threshold: 10_000,
            batch_interval_ms: 3_600_000,
        }
    }
}

/// Thresholds used by counter/progress logic that aren't tied to a single stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ThresholdsConfig {
    /// Minimum micrograph gap before a count-mismatch re-run is considered
    /// worth logging with detail. Informational only; the re-run itself
    /// fires on any gap > 0.
    pub min_logged_gap: u64,
}

/// Cluster resource knobs an operator can override; `0`/`1` mean "use the
/// per-stage default" under the auto MPI/GPU policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SlurmConfig {
    pub partition: Option<String>,
    pub mpi: u32,
    pub threads: u32,
    pub gpu_count: u32,
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
